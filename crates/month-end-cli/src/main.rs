mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortization::AmortizeArgs;
use commands::ar_recon::ArReconArgs;
use commands::close_calendar::CloseScheduleArgs;
use commands::fixed_assets::{ReconArgs, RollforwardCheckArgs};
use commands::forensics::{DuplicatesArgs, TargetSumArgs};

/// Month-end close reconciliation and workpaper calculations
#[derive(Parser)]
#[command(
    name = "mec",
    version,
    about = "Month-end close reconciliation and workpaper calculations",
    long_about = "A CLI for month-end close workpapers with decimal precision. \
                  Reconciles fixed-asset rollforwards against activity-by-year \
                  detail, AR aging against trial-balance detail, builds loan \
                  amortization schedules and close calendars, and chases \
                  unreconciled differences through detail exports."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a fixed-asset rollforward against activity-by-year detail
    FixedAssets(ReconArgs),
    /// Check that rollforward lines tie (beginning + activity = ending)
    RollforwardCheck(RollforwardCheckArgs),
    /// Reconcile AR aging against trial-balance detail
    ArRecon(ArReconArgs),
    /// Build a fixed-rate loan amortization schedule
    Amortize(AmortizeArgs),
    /// Build the month-end close calendar
    CloseSchedule(CloseScheduleArgs),
    /// Find duplicate rows in a detail export, ignoring designated columns
    Duplicates(DuplicatesArgs),
    /// Find amount combinations that explain a target difference
    TargetSum(TargetSumArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::FixedAssets(args) => commands::fixed_assets::run_reconcile(args),
        Commands::RollforwardCheck(args) => commands::fixed_assets::run_rollforward_check(args),
        Commands::ArRecon(args) => commands::ar_recon::run_ar_recon(args),
        Commands::Amortize(args) => commands::amortization::run_amortize(args),
        Commands::CloseSchedule(args) => commands::close_calendar::run_close_schedule(args),
        Commands::Duplicates(args) => commands::forensics::run_duplicates(args),
        Commands::TargetSum(args) => commands::forensics::run_target_sum(args),
        Commands::Version => {
            println!("mec {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
