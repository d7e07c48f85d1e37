//! Fetch-and-save phase.
//!
//! Reads the identifier list, fetches every product through the bounded
//! pool, and writes the successes to numbered batch files.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::batch::fetch_all;
use crate::config::Config;
use crate::fetch::{HttpFetcher, ProductSource};
use crate::file_sink;
use crate::ids::read_ids;

/// Counts reported at the end of a fetch run.
#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    pub requested: usize,
    pub fetched: usize,
    pub failed: usize,
    pub files: Vec<PathBuf>,
}

pub async fn run_fetch(config: &Config) -> Result<FetchSummary> {
    let ids = read_ids(&config.input.ids_path)?;
    tracing::info!(
        count = ids.len(),
        path = %config.input.ids_path.display(),
        "loaded product ids"
    );

    let fetcher = HttpFetcher::from_config(&config.api).context("Failed to build HTTP client")?;
    run_fetch_with_source(config, Arc::new(fetcher), &ids).await
}

/// Same as [`run_fetch`] with an explicit source and identifier list.
pub async fn run_fetch_with_source(
    config: &Config,
    source: Arc<dyn ProductSource>,
    ids: &[i64],
) -> Result<FetchSummary> {
    let report = fetch_all(source, ids, config.api.pool_size).await;
    let files = file_sink::save(
        &report.products,
        &config.output.dir,
        config.output.batch_size,
    )?;

    Ok(FetchSummary {
        requested: ids.len(),
        fetched: report.products.len(),
        failed: report.failed.len(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductRecord;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct SmallIds;

    #[async_trait]
    impl ProductSource for SmallIds {
        async fn fetch(&self, id: i64) -> Option<ProductRecord> {
            (id <= 3).then(|| ProductRecord {
                id,
                name: None,
                url_key: None,
                price: None,
                description: format!("item {id}"),
                images_url: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_and_save_summary() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.output.dir = tmp.path().join("out");
        config.output.batch_size = 2;

        let summary = run_fetch_with_source(&config, Arc::new(SmallIds), &[1, 2, 3, 4, 5])
            .await
            .unwrap();
        assert_eq!(summary.requested, 5);
        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.files.len(), 2);
        assert!(config.output.dir.join("products_2.json").exists());
    }

    #[tokio::test]
    async fn test_missing_id_file_has_no_side_effects() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.input.ids_path = tmp.path().join("missing.csv");
        config.output.dir = tmp.path().join("out");

        assert!(run_fetch(&config).await.is_err());
        assert!(!config.output.dir.exists());
    }
}
