//! Workpaper forensics helpers.
//!
//! `duplicates` flags detail rows that repeat under different document
//! numbers; `target_sum` searches a column for combinations of amounts that
//! explain an unreconciled difference.

pub mod duplicates;
pub mod target_sum;

pub use duplicates::{find_duplicates, DuplicateMatch, DuplicateReport, IgnoredColumn};
pub use target_sum::{find_target_sums, TargetSumInput, TargetSumMatch, TargetSumReport};
