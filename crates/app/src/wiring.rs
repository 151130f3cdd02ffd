use std::sync::Arc;

use reqwest::Client;
use thiserror::Error;
use tracing::warn;

use crate::config::AppConfig;
use crate::state::AppState;
use snoosync_infra::db::{DbPoolError, connect_lazy};
use snoosync_infra::reddit::RedditClient;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("db error: {0}")]
    Db(#[from] DbPoolError),
}

pub fn build_state(config: AppConfig) -> Result<AppState, WiringError> {
    let client = Client::builder().build()?;
    let reddit = RedditClient::new(client, config.user_agent.clone());
    let db = match config.warehouse_url.as_deref() {
        Some(url) => Some(connect_lazy(url)?),
        None => {
            warn!("warehouse db not configured; running fetch-only");
            None
        }
    };
    Ok(AppState {
        config: Arc::new(config),
        reddit,
        db,
    })
}
