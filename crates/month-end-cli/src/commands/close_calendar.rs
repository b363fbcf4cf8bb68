use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use serde_json::Value;

use month_end_core::close_calendar::{
    build_schedule, render_email_markdown, CloseCalendarInput, CloseSystems,
};

use crate::input;

/// Arguments for building the close calendar
#[derive(Args)]
pub struct CloseScheduleArgs {
    /// Path to JSON input file with the calendar input
    #[arg(long)]
    pub input: Option<String>,

    /// Closing year (defaults to the current year)
    #[arg(long)]
    pub year: Option<i32>,

    /// Closing month, 1-12 (defaults to the current month)
    #[arg(long)]
    pub month: Option<u32>,

    /// Holiday to skip when counting business days, YYYY-MM-DD (repeatable)
    #[arg(long = "holiday")]
    pub holidays: Vec<String>,

    /// ERP system name used in the memo
    #[arg(long)]
    pub erp: Option<String>,

    /// Statement system name used in the memo
    #[arg(long)]
    pub statements: Option<String>,

    /// Warehouses named in the inventory-freeze steps
    #[arg(long)]
    pub warehouses: Option<String>,

    /// Timezone label for deadlines, e.g. MDT
    #[arg(long)]
    pub timezone: Option<String>,

    /// Signature block appended to the memo
    #[arg(long)]
    pub signature: Option<String>,

    /// Include the rendered Markdown memo in the output
    /// (print it raw with --output minimal)
    #[arg(long)]
    pub email: bool,
}

pub fn run_close_schedule(args: CloseScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let calendar_input: CloseCalendarInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let today = Local::now().date_naive();
        let mut holidays = Vec::with_capacity(args.holidays.len());
        for holiday in &args.holidays {
            holidays.push(
                NaiveDate::parse_from_str(holiday, "%Y-%m-%d")
                    .map_err(|e| format!("--holiday '{}' is not YYYY-MM-DD: {}", holiday, e))?,
            );
        }
        CloseCalendarInput {
            year: args.year.unwrap_or_else(|| today.year()),
            month: args.month.unwrap_or_else(|| today.month()),
            holidays,
        }
    };

    let mut systems = CloseSystems::default();
    if let Some(erp) = args.erp {
        systems.erp = erp;
    }
    if let Some(statements) = args.statements {
        systems.statements = statements;
    }
    if let Some(warehouses) = args.warehouses {
        systems.warehouses = warehouses;
    }
    if let Some(timezone) = args.timezone {
        systems.timezone_label = timezone;
    }
    systems.signature = args.signature;

    let output = build_schedule(&calendar_input, &systems)?;
    let memo = args
        .email
        .then(|| render_email_markdown(&output.result, &systems));

    let mut value = serde_json::to_value(output)?;
    if let Some(memo) = memo {
        if let Some(result) = value.get_mut("result").and_then(Value::as_object_mut) {
            result.insert("email_markdown".into(), Value::String(memo));
        }
    }
    Ok(value)
}
