mod cli;
mod config;
mod pipeline;
mod state;
mod wiring;

use clap::Parser;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::ConfigError;
use crate::pipeline::PipelineError;
use crate::wiring::WiringError;
use snoosync_infra::db::run_migrations;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("wiring error: {0}")]
    Wiring(#[from] WiringError),
    #[error("db error: {0}")]
    Db(#[from] snoosync_infra::db::DbPoolError),
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    let mut config = config::AppConfig::from_env()?;
    if let Some(subreddit) = cli.subreddit {
        config.subreddit = subreddit;
    }
    if let Some(limit) = cli.limit {
        config.limit = limit;
    }
    if let Some(timeline) = cli.timeline {
        config.timeline = timeline.into();
    }

    let state = wiring::build_state(config)?;
    if let Some(pool) = state.db.as_ref() {
        run_migrations(pool).await?;
    }

    let stats = pipeline::run(&state, cli.dry_run).await?;
    info!(?stats, "pipeline run complete");
    Ok(())
}
