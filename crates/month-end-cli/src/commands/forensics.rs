use std::str::FromStr;

use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use month_end_core::forensics::{find_duplicates, find_target_sums, TargetSumInput};

use crate::input;

/// Arguments for duplicate row detection
#[derive(Args)]
pub struct DuplicatesArgs {
    /// Path to the CSV export to scan
    pub file: String,

    /// Column to ignore when comparing rows (repeatable)
    #[arg(long = "ignore", default_value = "InvNo")]
    pub ignore_columns: Vec<String>,
}

/// Arguments for the target-sum search
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct TargetSumArgs {
    /// Path to JSON input file (overrides the CSV flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to the CSV export holding the amounts
    #[arg(long)]
    pub file: Option<String>,

    /// Column holding the numeric amounts
    #[arg(long, default_value = "Amount")]
    pub column: String,

    /// Target difference to explain
    #[arg(long)]
    pub target: Option<Decimal>,

    /// Tolerance for matching the target
    #[arg(long, default_value = "0.01")]
    pub tolerance: Decimal,

    /// Maximum combination size
    #[arg(long, default_value = "5")]
    pub max_size: usize,

    /// Stop after this many matches (0 = unlimited)
    #[arg(long, default_value = "50")]
    pub max_matches: usize,
}

pub fn run_duplicates(args: DuplicatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (headers, rows) = input::csv_in::read_table(&args.file)?;
    let result = find_duplicates(&headers, &rows, &args.ignore_columns)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_target_sum(args: TargetSumArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let search_input: TargetSumInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let file = args
            .file
            .as_deref()
            .ok_or("--file <file.csv> is required (or provide --input)")?;
        let target = args
            .target
            .ok_or("--target is required (or provide --input)")?;

        let (headers, rows) = input::csv_in::read_table(file)?;
        let column_idx = headers
            .iter()
            .position(|h| h == &args.column)
            .ok_or_else(|| format!("Column '{}' not found in '{}'", args.column, file))?;

        let mut amounts = Vec::with_capacity(rows.len());
        for (row, cells) in rows.iter().enumerate() {
            let raw = cells
                .get(column_idx)
                .map(|s| s.trim().replace(',', ""))
                .unwrap_or_default();
            if raw.is_empty() {
                continue;
            }
            let amount = Decimal::from_str(&raw)
                .map_err(|e| format!("Row {} has non-numeric amount '{}': {}", row + 2, raw, e))?;
            amounts.push(amount);
        }

        TargetSumInput {
            amounts,
            target,
            tolerance: args.tolerance,
            max_size: args.max_size,
            max_matches: args.max_matches,
        }
    };

    let result = find_target_sums(&search_input)?;
    Ok(serde_json::to_value(result)?)
}
