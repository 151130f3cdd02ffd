pub mod client;

pub use client::{RedditClient, RedditError, MAX_PAGE_SIZE, REQUEST_TIMEOUT};
