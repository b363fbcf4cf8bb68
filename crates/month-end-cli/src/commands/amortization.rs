use chrono::NaiveDate;
use clap::Args;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use month_end_core::amortization::{build_schedule, LoanInput};

use crate::input;

/// Arguments for building an amortization schedule
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AmortizeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate as a fraction (e.g. 0.065 for 6.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in months
    #[arg(long, conflicts_with = "years")]
    pub months: Option<u32>,

    /// Loan term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// First payment date, YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<String>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let term_months = match (args.months, args.years) {
            (Some(months), _) => months,
            (None, Some(years)) => (years * dec!(12))
                .round()
                .to_u32()
                .ok_or_else(|| format!("--years {} does not give a usable term", years))?,
            (None, None) => return Err("--months or --years is required (or provide --input)".into()),
        };
        let start_date = args
            .start_date
            .as_deref()
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|e| format!("--start-date '{}' is not YYYY-MM-DD: {}", s, e))
            })
            .transpose()?;

        LoanInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_months,
            start_date,
        }
    };

    let result = build_schedule(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}
