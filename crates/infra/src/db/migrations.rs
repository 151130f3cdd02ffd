use sqlx::migrate::Migrator;

use super::{DbPool, DbPoolError};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Applies the warehouse schema (posts and post_comments tables).
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbPoolError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}
