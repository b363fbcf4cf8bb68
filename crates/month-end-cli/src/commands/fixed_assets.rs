use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use month_end_core::fixed_assets::{
    check_report_ties, reconcile_reports, ActivityDetailEntry, ActivityReport, RollforwardLine,
    RollforwardReport,
};

use crate::input;

/// Arguments for the rollforward vs activity reconciliation
#[derive(Args)]
pub struct ReconArgs {
    /// Path to JSON input file holding both reports
    /// ({"rollforward": {...}, "activity": {...}})
    #[arg(long)]
    pub input: Option<String>,

    /// Path to the rollforward CSV export
    #[arg(long)]
    pub rollforward: Option<String>,

    /// Path to the activity-by-year CSV export
    #[arg(long)]
    pub activity: Option<String>,

    /// Period label for CSV inputs, e.g. FY2024
    #[arg(long)]
    pub period: Option<String>,
}

/// Arguments for the rollforward tie check
#[derive(Args)]
pub struct RollforwardCheckArgs {
    /// Path to JSON input file with a rollforward report
    #[arg(long)]
    pub input: Option<String>,

    /// Path to the rollforward CSV export
    #[arg(long)]
    pub rollforward: Option<String>,

    /// Period label for CSV input
    #[arg(long, default_value = "unspecified")]
    pub period: String,
}

#[derive(Deserialize)]
struct ReconInput {
    rollforward: RollforwardReport,
    activity: ActivityReport,
}

pub fn run_reconcile(args: ReconArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let recon_input: ReconInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let rollforward_path = args
            .rollforward
            .as_deref()
            .ok_or("--rollforward <file.csv> is required (or provide --input)")?;
        let activity_path = args
            .activity
            .as_deref()
            .ok_or("--activity <file.csv> is required (or provide --input)")?;
        let period = args
            .period
            .clone()
            .ok_or("--period is required with CSV inputs")?;

        let lines: Vec<RollforwardLine> = input::csv_in::read_records(rollforward_path)?;
        let entries: Vec<ActivityDetailEntry> = input::csv_in::read_records(activity_path)?;
        ReconInput {
            rollforward: RollforwardReport {
                period: period.clone(),
                lines,
            },
            activity: ActivityReport { period, entries },
        }
    };

    let result = reconcile_reports(&recon_input.rollforward, &recon_input.activity)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_rollforward_check(
    args: RollforwardCheckArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let report: RollforwardReport = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let path = args
            .rollforward
            .as_deref()
            .ok_or("--rollforward <file.csv> is required (or provide --input)")?;
        let lines: Vec<RollforwardLine> = input::csv_in::read_records(path)?;
        RollforwardReport {
            period: args.period.clone(),
            lines,
        }
    };

    let result = check_report_ties(&report)?;
    Ok(serde_json::to_value(result)?)
}
