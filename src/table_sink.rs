//! Batch files → `products` table.
//!
//! Every record is inserted in its own transaction. A record that cannot be
//! decoded or inserted is rolled back and logged; the rest of the file and
//! the remaining files are still processed.

use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::db;
use crate::file_sink::batch_index;
use crate::models::{LoadReport, ProductRecord};

/// `load` phase: connect, load `config.output.dir`, close.
///
/// The database must already be initialized; it is never created here. The
/// pool is closed whether or not loading succeeds.
pub async fn run_load(config: &Config) -> Result<LoadReport> {
    let pool = db::connect_existing(config)
        .await
        .context("Cannot connect to the products database")?;

    let result = load(&pool, &config.output.dir).await;
    pool.close().await;
    result
}

/// Insert every record of every batch file in `dir`.
///
/// Files are processed in ascending batch number. An unreadable file aborts
/// the load; per-record failures do not.
pub async fn load(pool: &SqlitePool, dir: &Path) -> Result<LoadReport> {
    let mut report = LoadReport::default();
    let result = load_files(pool, dir, &mut report).await;

    tracing::info!(
        files = report.files,
        inserted = report.inserted,
        failed = report.failed,
        "load finished"
    );
    result.map(|()| report)
}

async fn load_files(pool: &SqlitePool, dir: &Path, report: &mut LoadReport) -> Result<()> {
    for path in batch_files(dir)? {
        let records = read_batch_file(&path)?;
        report.files += 1;

        for (index, record) in records.into_iter().enumerate() {
            let product = match record {
                Ok(product) => product,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(
                        path = %path.display(),
                        index,
                        error = %err,
                        "skipping undecodable record"
                    );
                    continue;
                }
            };

            match insert_product(pool, &product).await {
                Ok(()) => {
                    report.inserted += 1;
                    tracing::debug!(id = product.id, "inserted product");
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(id = product.id, error = %err, "insert failed, rolled back");
                }
            }
        }
    }
    Ok(())
}

/// Batch files in `dir`, sorted by batch number.
pub fn batch_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read batch directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if let Some(index) = name.to_str().and_then(batch_index) {
            files.push((index, entry.path()));
        }
    }

    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Read one batch file, decoding each record independently.
///
/// The outer error means the file itself is unusable (I/O failure or not a
/// JSON array); inner errors belong to single records.
pub fn read_batch_file(path: &Path) -> Result<Vec<Result<ProductRecord, serde_json::Error>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
    let items: Vec<Value> = serde_json::from_str(&content)
        .with_context(|| format!("Batch file is not a JSON array: {}", path.display()))?;

    Ok(items.into_iter().map(serde_json::from_value).collect())
}

async fn insert_product(pool: &SqlitePool, product: &ProductRecord) -> Result<()> {
    let images_json = serde_json::to_string(&product.images_url)?;

    let mut tx = pool.begin().await?;
    let inserted = sqlx::query(
        r#"
        INSERT INTO products (id, name, url_key, price, description, images_url)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.url_key)
    .bind(product.price.as_ref().map(|p| p.to_string()))
    .bind(&product.description)
    .bind(&images_json)
    .execute(&mut *tx)
    .await;

    match inserted {
        Ok(_) => {
            tx.commit().await?;
            Ok(())
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(id = product.id, error = %rollback_err, "rollback failed");
            }
            Err(err.into())
        }
    }
}
