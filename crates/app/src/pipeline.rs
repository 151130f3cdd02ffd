use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::state::AppState;
use snoosync_infra::db::{
    CommentsRepoError, PostRecord, PostsRepoError, replace_post_comments, upsert_post,
};
use snoosync_infra::reddit::RedditError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("reddit error: {0}")]
    Reddit(#[from] RedditError),
    #[error("posts db error: {0}")]
    PostsDb(#[from] PostsRepoError),
    #[error("comments db error: {0}")]
    CommentsDb(#[from] CommentsRepoError),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Default)]
pub struct PipelineStats {
    pub posts_fetched: usize,
    pub posts_loaded: usize,
    pub comments_fetched: usize,
    pub comments_loaded: usize,
    pub posts_failed: usize,
}

struct SyncOutcome {
    comments_fetched: usize,
    loaded: bool,
}

const DATA_SUBDIRS: [&str; 3] = ["raw", "transform", "load"];

/// One ETL run: token, post listing, then each post's comment tree in
/// sequence. A failing post is counted and logged without aborting the
/// rest of the run; failures before the per-post loop abort outright.
pub async fn run(state: &AppState, dry_run: bool) -> Result<PipelineStats, PipelineError> {
    let config = state.config.as_ref();
    ensure_data_dirs(&config.data_dir)?;

    let token = state
        .reddit
        .get_access_token(&config.client_id, &config.secret_key)
        .await?;
    info!(
        subreddit = %config.subreddit,
        timeline = %config.timeline,
        limit = config.limit,
        "fetching posts"
    );
    let posts = state
        .reddit
        .fetch_posts(&config.subreddit, config.limit, &token, config.timeline)
        .await?;
    write_snapshot(
        &config.data_dir.join("raw"),
        &format!("posts_{}.json", config.subreddit),
        &posts,
    )?;

    let mut stats = PipelineStats {
        posts_fetched: posts.len(),
        ..PipelineStats::default()
    };
    let fetched_at = Utc::now();
    let load = !dry_run && state.db.is_some();
    if dry_run {
        info!("dry run; skipping warehouse load");
    }

    for payload in &posts {
        let Some(record) = PostRecord::from_payload(&config.subreddit, payload, fetched_at) else {
            warn!("post payload missing id; skipping");
            stats.posts_failed += 1;
            continue;
        };
        match sync_post(state, &record, &token, fetched_at, load).await {
            Ok(outcome) => {
                stats.comments_fetched += outcome.comments_fetched;
                if outcome.loaded {
                    stats.posts_loaded += 1;
                    stats.comments_loaded += outcome.comments_fetched;
                }
            }
            Err(err) => {
                stats.posts_failed += 1;
                warn!(error = %err, post_id = %record.post_id, "post sync failed");
            }
        }
    }

    Ok(stats)
}

async fn sync_post(
    state: &AppState,
    record: &PostRecord,
    token: &str,
    fetched_at: DateTime<Utc>,
    load: bool,
) -> Result<SyncOutcome, PipelineError> {
    let comments = state.reddit.fetch_comments(&record.post_id, token).await?;
    write_snapshot(
        &state.config.data_dir.join("transform"),
        &format!("comments_{}.json", record.post_id),
        &comments,
    )?;
    let mut loaded = false;
    if load {
        if let Some(pool) = state.db.as_ref() {
            upsert_post(pool, record).await?;
            replace_post_comments(pool, &record.post_id, &comments, fetched_at).await?;
            loaded = true;
        }
    }
    Ok(SyncOutcome {
        comments_fetched: comments.len(),
        loaded,
    })
}

fn ensure_data_dirs(base: &Path) -> Result<(), std::io::Error> {
    for sub in DATA_SUBDIRS {
        let dir = base.join(sub);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            info!(dir = %dir.display(), "created data directory");
        }
    }
    Ok(())
}

fn write_snapshot<T: serde::Serialize>(
    dir: &Path,
    file_name: &str,
    value: &T,
) -> Result<(), PipelineError> {
    let body = serde_json::to_vec_pretty(value)?;
    fs::write(dir.join(file_name), body)?;
    Ok(())
}
