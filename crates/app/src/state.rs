use std::sync::Arc;

use crate::config::AppConfig;
use snoosync_infra::db::DbPool;
use snoosync_infra::reddit::RedditClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub reddit: RedditClient,
    pub db: Option<DbPool>,
}
