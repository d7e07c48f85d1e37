use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub db: DbConfig,
}

/// Upstream catalog API and fetch pool settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            pool_size: default_pool_size(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_endpoint() -> String {
    "https://api.tiki.vn/product-detail/api/v1/products/".to_string()
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    2_000
}
fn default_max_backoff_ms() -> u64 {
    30_000
}
fn default_pool_size() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_ids_path")]
    pub ids_path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            ids_path: default_ids_path(),
        }
    }
}

fn default_ids_path() -> PathBuf {
    PathBuf::from("products_id.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_batch_size() -> usize {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/products.sqlite")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but falls back to built-in defaults when `path`
/// does not exist.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config(path);
    }
    tracing::debug!(path = %path.display(), "config file not found, using defaults");
    Ok(Config::default())
}

fn validate(config: &Config) -> Result<()> {
    if config.api.endpoint.trim().is_empty() {
        anyhow::bail!("api.endpoint must not be empty");
    }
    if config.api.pool_size == 0 {
        anyhow::bail!("api.pool_size must be >= 1");
    }
    if config.api.max_attempts == 0 {
        anyhow::bail!("api.max_attempts must be >= 1");
    }
    if config.api.initial_backoff_ms > config.api.max_backoff_ms {
        anyhow::bail!("api.initial_backoff_ms must be <= api.max_backoff_ms");
    }
    if config.output.batch_size == 0 {
        anyhow::bail!("output.batch_size must be > 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api.pool_size, 10);
        assert_eq!(config.api.max_attempts, 3);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.output.batch_size, 1000);
        assert_eq!(config.output.dir, PathBuf::from("output"));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str("[api]\npool_size = 4\n").unwrap();
        assert_eq!(config.api.pool_size, 4);
        assert_eq!(config.api.initial_backoff_ms, 2_000);
        assert!(config.api.endpoint.ends_with("/products/"));
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let config: Config = toml::from_str("[api]\npool_size = 0\n").unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config: Config = toml::from_str("[output]\nbatch_size = 0\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_backoff_bounds_checked() {
        let config: Config =
            toml::from_str("[api]\ninitial_backoff_ms = 5000\nmax_backoff_ms = 100\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_or_default(Path::new("/nonexistent/catalog.toml")).unwrap();
        assert_eq!(config.db.path, PathBuf::from("data/products.sqlite"));
    }
}
