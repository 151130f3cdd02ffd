pub mod domain;
pub mod error;

pub use domain::comments::FlatComment;
pub use domain::timeline::Timeline;
pub use error::CoreError;
