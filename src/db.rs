use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::Config;

/// Open the products database described by `config`.
///
/// The returned pool is the only handle to the sink; callers close it when
/// their phase ends.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    // Single writer: records are inserted one transaction at a time.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to database: {}", db_path.display()))?;

    Ok(pool)
}

/// Open an already initialized products database.
///
/// Unlike [`connect`], nothing is created: a missing file or a missing
/// `products` table is an error pointing at `catalog init`.
pub async fn connect_existing(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;
    if !db_path.is_file() {
        anyhow::bail!(
            "Database not found: {} (run `catalog init` first)",
            db_path.display()
        );
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(false)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to database: {}", db_path.display()))?;

    let initialized: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'products'",
    )
    .fetch_one(&pool)
    .await
    .context("Failed to inspect database schema")?;

    if !initialized {
        pool.close().await;
        anyhow::bail!(
            "Database {} has no products table (run `catalog init` first)",
            db_path.display()
        );
    }

    Ok(pool)
}
