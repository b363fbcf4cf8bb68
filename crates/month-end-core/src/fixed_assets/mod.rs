//! Fixed-asset rollforward vs activity-by-year reconciliation.
//!
//! Two exports describe the same period of asset activity under different
//! column conventions: the rollforward carries beginning/ending cost with
//! signed disposal columns, the activity-by-year report lists additions and
//! disposals as unsigned detail with an acquired-and-disposed add-back.
//! This module computes the net change under each convention and the
//! residual difference per account.

pub mod activity;
pub mod reconcile;
pub mod rollforward;

pub use activity::{
    net_change_activity, ActivityCategory, ActivityDetailEntry, ActivityReport,
};
pub use reconcile::{reconcile_line, reconcile_reports, FixedAssetRecon, ReconLine};
pub use rollforward::{
    check_report_ties, check_tie, net_change_rollforward, ties, AssetClass, RollforwardLine,
    RollforwardReport, TieCheck, TieCheckLine,
};
