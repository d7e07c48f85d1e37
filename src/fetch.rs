//! Per-item product fetcher.
//!
//! Issues `GET <endpoint><id>` against the catalog API and normalizes the
//! response into a [`ProductRecord`].
//!
//! # Retry Strategy
//!
//! Failures are split into two tiers:
//! - **Transient**: request timeout, connection failure, HTTP 5xx. Retried
//!   with exponential backoff up to [`RetryPolicy::max_attempts`] total
//!   attempts.
//! - **Permanent**: HTTP 404, any other non-2xx status, an undecodable body,
//!   a payload missing required fields. Returned immediately.
//!
//! Backoff doubles from `initial_backoff` and is capped at `max_backoff`
//! (defaults: 2s, 4s, 8s, … up to 30s).

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::models::ProductRecord;
use crate::normalize::normalize;

/// Anything that can turn an identifier into a record.
///
/// The batch coordinator only depends on this trait, so the HTTP fetcher can
/// be swapped for an in-memory source in tests.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetch and normalize one product. `None` means the identifier failed
    /// for this run, whatever the cause.
    async fn fetch(&self, id: i64) -> Option<ProductRecord>;
}

/// Why a fetch produced no record.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("product not found (404)")]
    NotFound,
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("connection failed: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("server error: {0}")]
    Server(StatusCode),
    #[error("unexpected HTTP status: {0}")]
    Status(StatusCode),
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("malformed response body: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("payload missing required fields")]
    Incomplete,
}

impl FetchError {
    /// Whether another attempt may succeed within this run.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout(_) | FetchError::Connect(_) | FetchError::Server(_)
        )
    }

    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err)
        } else if err.is_connect() || err.is_request() {
            FetchError::Connect(err)
        } else {
            FetchError::Request(err)
        }
    }
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(api: &ApiConfig) -> Self {
        Self {
            max_attempts: api.max_attempts.max(1),
            initial_backoff: Duration::from_millis(api.initial_backoff_ms),
            max_backoff: Duration::from_millis(api.max_backoff_ms),
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exp)
            .min(self.max_backoff)
    }
}

/// [`ProductSource`] backed by the catalog HTTP API.
pub struct HttpFetcher {
    client: reqwest::Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(
        endpoint: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            retry,
        })
    }

    pub fn from_config(api: &ApiConfig) -> anyhow::Result<Self> {
        Self::new(
            api.endpoint.clone(),
            &api.user_agent,
            api.timeout(),
            RetryPolicy::from_config(api),
        )
    }

    pub fn url_for(&self, id: i64) -> String {
        format!("{}{}", self.endpoint, id)
    }

    /// Fetch one product, retrying transient failures.
    pub async fn fetch_product(&self, id: i64) -> Result<ProductRecord, FetchError> {
        let mut attempt = 1;
        loop {
            match self.attempt(id).await {
                Ok(record) => return Ok(record),
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::debug!(
                        id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient fetch failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt(&self, id: i64) -> Result<ProductRecord, FetchError> {
        let response = self
            .client
            .get(self.url_for(id))
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if status.is_server_error() {
            return Err(FetchError::Server(status));
        }
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(FetchError::from_transport)?;
        let raw: serde_json::Value =
            serde_json::from_slice(&body).map_err(FetchError::Malformed)?;

        normalize(&raw).ok_or(FetchError::Incomplete)
    }
}

#[async_trait]
impl ProductSource for HttpFetcher {
    async fn fetch(&self, id: i64) -> Option<ProductRecord> {
        match self.fetch_product(id).await {
            Ok(record) => {
                tracing::info!(id, "fetched product");
                Some(record)
            }
            Err(FetchError::NotFound) => {
                tracing::warn!(id, "product does not exist (404)");
                None
            }
            Err(err @ FetchError::Timeout(_)) => {
                tracing::warn!(id, error = %err, "timed out fetching product");
                None
            }
            Err(err @ (FetchError::Malformed(_) | FetchError::Incomplete)) => {
                tracing::warn!(id, error = %err, "unusable product payload");
                None
            }
            Err(err) => {
                tracing::error!(id, error = %err, "failed to fetch product");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(4), Duration::from_secs(16));
        assert_eq!(policy.delay_for(5), Duration::from_secs(30));
        assert_eq!(policy.delay_for(40), Duration::from_secs(30));
    }

    #[test]
    fn test_policy_from_config() {
        let api = ApiConfig {
            max_attempts: 0,
            initial_backoff_ms: 10,
            max_backoff_ms: 50,
            ..ApiConfig::default()
        };
        let policy = RetryPolicy::from_config(&api);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay_for(1), Duration::from_millis(10));
        assert_eq!(policy.delay_for(4), Duration::from_millis(50));
    }

    #[test]
    fn test_classification_tiers() {
        assert!(FetchError::Server(StatusCode::SERVICE_UNAVAILABLE).is_transient());
        assert!(!FetchError::NotFound.is_transient());
        assert!(!FetchError::Status(StatusCode::FORBIDDEN).is_transient());
        assert!(!FetchError::Incomplete.is_transient());
    }

    #[test]
    fn test_url_appends_identifier() {
        let fetcher = HttpFetcher::new(
            "https://example.test/products/",
            "test-agent",
            Duration::from_secs(1),
            RetryPolicy::default(),
        )
        .unwrap();
        assert_eq!(fetcher.url_for(42), "https://example.test/products/42");
    }
}
