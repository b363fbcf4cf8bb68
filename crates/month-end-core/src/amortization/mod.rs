//! Fixed-rate loan amortization schedules.

pub mod schedule;

pub use schedule::{
    build_schedule, monthly_payment, AmortizationRow, AmortizationSchedule, LoanInput,
};
