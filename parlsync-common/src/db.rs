//! Database pool initialization

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection pool, creating the file if needed
///
/// The session is single-threaded but contact/mandate lookups interleave
/// with writes, so the pool keeps a handful of connections warm.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pragmas(&pool).await?;

    // WAL keeps readers (the query API) unblocked while a session writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    Ok(pool)
}

/// Open an in-memory database (tests)
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePool::connect("sqlite::memory:").await?;
    configure_pragmas(&pool).await?;
    Ok(pool)
}

/// Apply connection pragmas
///
/// Foreign keys must be enabled for cascade deletes during the sweep.
async fn configure_pragmas(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;
    Ok(())
}
