//! Database adapters: SQLite pool construction and embedded migrations.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::config::DatabaseConfig;
use crate::store::{StoreResult, map_sqlx_error};

/// Open a pool for the configured database.
///
/// Foreign keys are switched on for every connection so `ON DELETE CASCADE`
/// holds. File databases use WAL; an in-memory database is pinned to a single
/// connection that is never recycled, otherwise its contents would vanish.
pub async fn connect(config: &DatabaseConfig) -> StoreResult<SqlitePool> {
    let mut options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| map_sqlx_error("parse_database_url", e))?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool = SqlitePoolOptions::new().acquire_timeout(config.connect_timeout());

    if config.is_in_memory() {
        pool = pool.max_connections(1).idle_timeout(None).max_lifetime(None);
    } else {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.connect_timeout());
        pool = pool.max_connections(config.max_connections.max(1));
    }

    let pool = pool
        .connect_with(options)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;

    tracing::debug!(url = %config.url, "database pool opened");
    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn migrate(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Connect and bring the schema up to date.
pub async fn connect_and_migrate(config: &DatabaseConfig) -> StoreResult<SqlitePool> {
    let pool = connect(config).await?;
    migrate(&pool).await?;
    Ok(pool)
}
