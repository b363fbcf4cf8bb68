use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use month_end_core::ar_recon::{reconcile_invoices, OpenInvoice};

use crate::input;

/// Arguments for the AR aging vs trial-balance reconciliation
#[derive(Args)]
pub struct ArReconArgs {
    /// Path to JSON input file ({"aged": [...], "trial_balance": [...]})
    #[arg(long)]
    pub input: Option<String>,

    /// Path to the AR aging CSV export
    #[arg(long)]
    pub aged: Option<String>,

    /// Path to the AR trial-balance detail CSV export
    #[arg(long, alias = "tb")]
    pub trial_balance: Option<String>,
}

#[derive(Deserialize)]
struct ArReconInput {
    aged: Vec<OpenInvoice>,
    trial_balance: Vec<OpenInvoice>,
}

pub fn run_ar_recon(args: ArReconArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let recon_input: ArReconInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let aged_path = args
            .aged
            .as_deref()
            .ok_or("--aged <file.csv> is required (or provide --input)")?;
        let tb_path = args
            .trial_balance
            .as_deref()
            .ok_or("--trial-balance <file.csv> is required (or provide --input)")?;
        ArReconInput {
            aged: input::csv_in::read_records(aged_path)?,
            trial_balance: input::csv_in::read_records(tb_path)?,
        }
    };

    let result = reconcile_invoices(&recon_input.aged, &recon_input.trial_balance)?;
    Ok(serde_json::to_value(result)?)
}
