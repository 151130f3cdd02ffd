use sqlx::PgPool;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub type DbPool = PgPool;

#[derive(Debug, Error)]
pub enum DbPoolError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("sqlx migrate error: {0}")]
    Migrate(#[from] MigrateError),
}

/// Lazy pool: the first warehouse query opens the connection, so a run
/// without a reachable database only fails once the load step starts.
pub fn connect_lazy(database_url: &str) -> Result<DbPool, DbPoolError> {
    Ok(PgPoolOptions::new()
        .max_connections(5)
        .connect_lazy(database_url)?)
}
