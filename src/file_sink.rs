//! Numbered JSON batch files.
//!
//! Records are split into consecutive chunks and chunk `n` (1-based) is
//! written to `products_<n>.json` as a 4-space indented JSON array. Non-ASCII
//! text is written as-is.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::ProductRecord;

pub const BATCH_FILE_PREFIX: &str = "products_";
pub const BATCH_FILE_EXT: &str = "json";

/// File name for the 1-based batch `index`.
pub fn batch_file_name(index: usize) -> String {
    format!("{BATCH_FILE_PREFIX}{index}.{BATCH_FILE_EXT}")
}

/// Parse the batch index out of a file name like `products_12.json`.
///
/// Only names [`batch_file_name`] could have produced are accepted: plain
/// decimal digits, no sign, no leading zero.
pub fn batch_index(file_name: &str) -> Option<usize> {
    let digits = file_name
        .strip_prefix(BATCH_FILE_PREFIX)?
        .strip_suffix(BATCH_FILE_EXT)?
        .strip_suffix('.')?;

    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

/// Write `records` to `output_dir` in chunks of at most `batch_size`.
///
/// Returns the written paths in batch order. An empty `records` slice writes
/// nothing.
pub fn save(
    records: &[ProductRecord],
    output_dir: &Path,
    batch_size: usize,
) -> Result<Vec<PathBuf>> {
    if batch_size == 0 {
        bail!("batch_size must be > 0");
    }
    if records.is_empty() {
        tracing::warn!("no products to save");
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output dir: {}", output_dir.display()))?;

    let mut written = Vec::new();
    for (i, chunk) in records.chunks(batch_size).enumerate() {
        let path = output_dir.join(batch_file_name(i + 1));
        write_batch(&path, chunk)?;
        tracing::info!(count = chunk.len(), path = %path.display(), "saved batch");
        written.push(path);
    }

    Ok(written)
}

fn write_batch(path: &Path, chunk: &[ProductRecord]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
    chunk
        .serialize(&mut ser)
        .with_context(|| format!("Failed to serialize batch {}", path.display()))?;

    writer.write_all(b"\n")?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: i64) -> ProductRecord {
        ProductRecord {
            id,
            name: Some(format!("Sản phẩm {id}")),
            url_key: Some(format!("san-pham-{id}")),
            price: serde_json::Number::from_f64(1000.5),
            description: "Mô tả".to_string(),
            images_url: vec![format!("https://cdn.test/{id}.jpg")],
        }
    }

    #[test]
    fn test_batch_file_name_round_trip() {
        assert_eq!(batch_file_name(3), "products_3.json");
        assert_eq!(batch_index("products_3.json"), Some(3));
        assert_eq!(batch_index("products_.json"), None);
        assert_eq!(batch_index("products_3.csv"), None);
        assert_eq!(batch_index("items_3.json"), None);
        assert_eq!(batch_index("products_3json"), None);
    }

    #[test]
    fn test_batch_index_rejects_non_canonical_names() {
        assert_eq!(batch_index("products_+1.json"), None);
        assert_eq!(batch_index("products_01.json"), None);
        assert_eq!(batch_index("products_0.json"), None);
        assert_eq!(batch_index("products_-1.json"), None);
        assert_eq!(batch_index("products_ 1.json"), None);
        assert_eq!(batch_index("products_10.json"), Some(10));
    }

    #[test]
    fn test_five_records_batch_of_two() {
        let tmp = TempDir::new().unwrap();
        let records: Vec<_> = (1..=5).map(record).collect();

        let paths = save(&records, tmp.path(), 2).unwrap();
        assert_eq!(paths.len(), 3);

        let sizes: Vec<usize> = paths
            .iter()
            .map(|p| {
                let text = std::fs::read_to_string(p).unwrap();
                serde_json::from_str::<Vec<ProductRecord>>(&text).unwrap().len()
            })
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(paths[2].file_name().unwrap(), "products_3.json");
    }

    #[test]
    fn test_creates_nested_output_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a").join("b");
        save(&[record(1)], &dir, 1000).unwrap();
        assert!(dir.join("products_1.json").exists());
    }

    #[test]
    fn test_empty_records_write_nothing() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("out");
        let paths = save(&[], &dir, 10).unwrap();
        assert!(paths.is_empty());
        assert!(!dir.exists());
    }

    #[test]
    fn test_unicode_unescaped_and_indented() {
        let tmp = TempDir::new().unwrap();
        let paths = save(&[record(9)], tmp.path(), 10).unwrap();
        let text = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(text.contains("Sản phẩm 9"));
        assert!(!text.contains("\\u"));
        assert!(text.contains("\n        \"id\": 9"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let tmp = TempDir::new().unwrap();
        assert!(save(&[record(1)], tmp.path(), 0).is_err());
    }
}
