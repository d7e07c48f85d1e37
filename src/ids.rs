use anyhow::{bail, Context, Result};
use std::path::Path;

const ID_COLUMN: &str = "id";

/// Read product identifiers from the `id` column of a CSV file.
///
/// The file must have a header row. Blank cells are skipped; order and
/// duplicates are preserved.
pub fn read_ids(path: &Path) -> Result<Vec<i64>> {
    if !path.exists() {
        bail!("Identifier file does not exist: {}", path.display());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open identifier file: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?;
    let Some(column) = headers.iter().position(|h| h == ID_COLUMN) else {
        bail!(
            "Identifier file {} has no '{}' column",
            path.display(),
            ID_COLUMN
        );
    };

    let mut ids = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV at row {}", row + 2))?;
        let cell = record.get(column).unwrap_or("");
        if cell.is_empty() {
            continue;
        }
        let id: i64 = cell
            .parse()
            .with_context(|| format!("Invalid id '{}' at row {}", cell, row + 2))?;
        ids.push(id);
    }

    Ok(ids)
}
