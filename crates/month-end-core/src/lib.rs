pub mod error;
pub mod types;

#[cfg(feature = "fixed_assets")]
pub mod fixed_assets;

#[cfg(feature = "ar_recon")]
pub mod ar_recon;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "close_calendar")]
pub mod close_calendar;

#[cfg(feature = "forensics")]
pub mod forensics;

pub use error::CloseError;
pub use types::*;

/// Standard result type for all month-end operations
pub type CloseResult<T> = Result<T, CloseError>;
