use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid timeline: {0}")]
    InvalidTimeline(String),
}
