//! Core data types that flow through the harvest pipeline.
//!
//! A [`ProductRecord`] is produced by the normalizer, written to batch files
//! by the file sink, and read back by the table sink.

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeSet;

/// A flattened, markup-free catalog item ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    pub name: Option<String>,
    pub url_key: Option<String>,
    /// Upstream price, kept as the exact JSON number.
    pub price: Option<Number>,
    pub description: String,
    #[serde(default)]
    pub images_url: Vec<String>,
}

/// Outcome of one coordinator run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Successfully fetched records, in input order.
    pub products: Vec<ProductRecord>,
    /// Identifiers for which no record could be produced.
    pub failed: BTreeSet<i64>,
}

/// Outcome of one table-sink run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub files: usize,
    pub inserted: u64,
    pub failed: u64,
}
