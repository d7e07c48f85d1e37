//! Bounded, order-preserving fan-out of fetches.
//!
//! Each identifier becomes its own tokio task; `buffered(pool_size)` keeps at
//! most `pool_size` of them in flight and yields results in input order, so
//! every outcome stays attributable to its identifier.

use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::fetch::ProductSource;
use crate::models::BatchReport;

/// Fetch every identifier through `source` with at most `pool_size`
/// concurrent requests.
///
/// Resolves once every fetch has finished. A failed (or panicked) fetch only
/// marks its own identifier as failed.
pub async fn fetch_all(
    source: Arc<dyn ProductSource>,
    ids: &[i64],
    pool_size: usize,
) -> BatchReport {
    let pool_size = pool_size.max(1);
    tracing::info!(total = ids.len(), pool_size, "fetching products");

    let outcomes: Vec<(i64, Option<_>)> = stream::iter(ids.iter().copied())
        .map(|id| {
            let source = Arc::clone(&source);
            let handle = tokio::spawn(async move { source.fetch(id).await });
            async move {
                match handle.await {
                    Ok(record) => (id, record),
                    Err(err) => {
                        tracing::error!(id, error = %err, "fetch task aborted");
                        (id, None)
                    }
                }
            }
        })
        .buffered(pool_size)
        .collect()
        .await;

    let mut report = BatchReport::default();
    for (id, outcome) in outcomes {
        match outcome {
            Some(record) => report.products.push(record),
            None => {
                report.failed.insert(id);
            }
        }
    }

    if !report.failed.is_empty() {
        tracing::warn!(
            count = report.failed.len(),
            failed = ?report.failed,
            "products that could not be fetched"
        );
    }
    tracing::info!(
        fetched = report.products.len(),
        failed = report.failed.len(),
        "fetch complete"
    );

    report
}
