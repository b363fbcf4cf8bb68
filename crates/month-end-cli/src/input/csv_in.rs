use serde::de::DeserializeOwned;

use super::file::resolve_path;

/// Read a CSV export into typed records. The first row must be a header
/// matching the record's field names.
pub fn read_records<T: DeserializeOwned>(path: &str) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&canonical)
        .map_err(|e| format!("Failed to open '{}': {}", canonical.display(), e))?;

    let mut records = Vec::new();
    for (row, result) in reader.deserialize().enumerate() {
        let record: T = result.map_err(|e| {
            format!(
                "Failed to parse '{}' row {}: {}",
                canonical.display(),
                row + 2,
                e
            )
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Read a CSV export as raw text: header row plus string cells. Used where
/// the column layout is not known in advance.
pub fn read_table(
    path: &str,
) -> Result<(Vec<String>, Vec<Vec<String>>), Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(&canonical)
        .map_err(|e| format!("Failed to open '{}': {}", canonical.display(), e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("Failed to read header of '{}': {}", canonical.display(), e))?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
        rows.push(record.iter().map(String::from).collect());
    }

    Ok((headers, rows))
}
