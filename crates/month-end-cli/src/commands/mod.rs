pub mod amortization;
pub mod ar_recon;
pub mod close_calendar;
pub mod fixed_assets;
pub mod forensics;
