use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::CloseError;
use crate::types::{with_metadata, ComputationOutput};
use crate::CloseResult;

const SAMPLE_COLUMNS: usize = 3;

/// Value of an ignored column on a duplicated row pair, e.g. the two invoice
/// numbers a duplicated billing line was posted under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoredColumn {
    pub column: String,
    pub value: String,
    pub first_value: String,
}

/// A row whose non-ignored columns exactly match an earlier row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateMatch {
    /// 1-based data row number, counting the header as row 1
    pub row_number: usize,
    pub matches_row: usize,
    pub ignored: Vec<IgnoredColumn>,
    /// First few compared columns, for eyeballing the match
    pub sample: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub unique_patterns: usize,
    pub duplicate_count: usize,
    pub duplicates: Vec<DuplicateMatch>,
}

/// Find rows that are identical on every column except the ignored ones.
///
/// Typical use: duplicate billing detection, where the invoice number column
/// is ignored because a re-keyed line gets a fresh number.
pub fn find_duplicates(
    headers: &[String],
    rows: &[Vec<String>],
    ignore_columns: &[String],
) -> CloseResult<ComputationOutput<DuplicateReport>> {
    let start = Instant::now();

    for column in ignore_columns {
        if !headers.contains(column) {
            return Err(CloseError::InvalidInput {
                field: "ignore_columns".into(),
                reason: format!("Column '{}' not present in the header row", column),
            });
        }
    }

    let compared: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !ignore_columns.contains(h))
        .map(|(i, _)| i)
        .collect();
    let ignored_idx: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| ignore_columns.contains(h))
        .map(|(i, _)| i)
        .collect();

    if compared.is_empty() {
        return Err(CloseError::InsufficientData(
            "Every column is ignored; nothing left to compare".into(),
        ));
    }

    let cell = |row: &[String], idx: usize| row.get(idx).map(|s| s.trim()).unwrap_or("").to_string();

    // Pattern -> (row number, ignored-column values of first occurrence)
    let mut seen: HashMap<Vec<String>, (usize, Vec<String>)> = HashMap::new();
    let mut duplicates = Vec::new();

    // Data starts at row 2; row 1 is the header.
    for (offset, row) in rows.iter().enumerate() {
        let row_number = offset + 2;
        let key: Vec<String> = compared.iter().map(|&i| cell(row, i)).collect();
        let ignored_values: Vec<String> = ignored_idx.iter().map(|&i| cell(row, i)).collect();

        match seen.get(&key) {
            Some((first_row, first_ignored)) => {
                let ignored = ignored_idx
                    .iter()
                    .enumerate()
                    .map(|(n, &i)| IgnoredColumn {
                        column: headers[i].clone(),
                        value: ignored_values[n].clone(),
                        first_value: first_ignored[n].clone(),
                    })
                    .collect();
                let sample = compared
                    .iter()
                    .take(SAMPLE_COLUMNS)
                    .map(|&i| (headers[i].clone(), cell(row, i)))
                    .collect();
                duplicates.push(DuplicateMatch {
                    row_number,
                    matches_row: *first_row,
                    ignored,
                    sample,
                });
            }
            None => {
                seen.insert(key, (row_number, ignored_values));
            }
        }
    }

    let result = DuplicateReport {
        unique_patterns: seen.len(),
        duplicate_count: duplicates.len(),
        duplicates,
    };

    let assumptions = json!({
        "ignored_columns": ignore_columns,
        "comparison": "exact match on trimmed cell text",
    });

    Ok(with_metadata(
        "Duplicate row detection ignoring designated columns",
        &assumptions,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        vec!["InvNo", "Customer", "Date", "Amount"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn row(inv: &str, customer: &str, date: &str, amount: &str) -> Vec<String> {
        vec![inv, customer, date, amount]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_duplicate_found_ignoring_invoice_column() {
        let rows = vec![
            row("INV-1", "Kalispell", "2025-10-01", "150.00"),
            row("INV-2", "Whitefish", "2025-10-02", "80.00"),
            row("INV-3", "Kalispell", "2025-10-01", "150.00"),
        ];
        let output = find_duplicates(&headers(), &rows, &["InvNo".to_string()]).unwrap();
        let report = &output.result;

        assert_eq!(report.unique_patterns, 2);
        assert_eq!(report.duplicate_count, 1);

        let dup = &report.duplicates[0];
        assert_eq!(dup.row_number, 4);
        assert_eq!(dup.matches_row, 2);
        assert_eq!(dup.ignored[0].value, "INV-3");
        assert_eq!(dup.ignored[0].first_value, "INV-1");
    }

    #[test]
    fn test_no_duplicates_when_amounts_differ() {
        let rows = vec![
            row("INV-1", "Kalispell", "2025-10-01", "150.00"),
            row("INV-2", "Kalispell", "2025-10-01", "151.00"),
        ];
        let output = find_duplicates(&headers(), &rows, &["InvNo".to_string()]).unwrap();
        assert_eq!(output.result.duplicate_count, 0);
    }

    #[test]
    fn test_whitespace_differences_still_match() {
        let rows = vec![
            row("INV-1", "Kalispell ", "2025-10-01", "150.00"),
            row("INV-2", " Kalispell", "2025-10-01", "150.00"),
        ];
        let output = find_duplicates(&headers(), &rows, &["InvNo".to_string()]).unwrap();
        assert_eq!(output.result.duplicate_count, 1);
    }

    #[test]
    fn test_unknown_ignore_column_rejected() {
        let err = find_duplicates(&headers(), &[], &["Nope".to_string()]).unwrap_err();
        assert!(matches!(err, CloseError::InvalidInput { .. }));
    }

    #[test]
    fn test_all_columns_ignored_rejected() {
        let all: Vec<String> = headers();
        let err = find_duplicates(&headers(), &[], &all).unwrap_err();
        assert!(matches!(err, CloseError::InsufficientData(_)));
    }
}
