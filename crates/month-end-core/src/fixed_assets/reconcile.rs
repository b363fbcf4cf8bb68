use std::collections::BTreeMap;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::CloseError;
use crate::types::{with_metadata, ComputationOutput, Money, CENT_TOLERANCE};
use crate::CloseResult;

use super::activity::{aggregate, AccountActivity, ActivityDetailEntry, ActivityReport};
use super::rollforward::{
    check_tie, net_change_rollforward, validate_line, AssetClass, RollforwardLine,
    RollforwardReport,
};

/// Per-account reconciliation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconLine {
    pub account_code: String,
    pub net_change_rollforward: Money,
    pub net_change_activity: Money,
    /// Rollforward net change minus activity net change
    pub net_difference: Money,
    /// Activity disposal total minus |rollforward disposals|. Disposal signs
    /// differ between the two conventions, so magnitudes are compared.
    pub disposals_variance: Money,
}

/// Net movement of construction-in-progress lines held out of the
/// comparison set, plus any activity detail posted under those accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipSummary {
    pub account_codes: Vec<String>,
    pub net_movement: Money,
    /// Net change of activity entries carried under CIP accounts; held out
    /// of the comparison but never dropped silently
    pub activity_net_change: Money,
}

/// Column totals across all compared accounts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconTotals {
    pub net_change_rollforward: Money,
    pub net_change_activity: Money,
    pub net_difference: Money,
    pub disposals_variance: Money,
}

/// Full reconciliation of one rollforward export against one activity export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedAssetRecon {
    pub period: String,
    pub lines: Vec<ReconLine>,
    pub totals: ReconTotals,
    /// Lines where |net_difference| exceeds the cent tolerance
    pub issue_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cip: Option<CipSummary>,
    pub missing_from_activity: Vec<String>,
    pub missing_from_rollforward: Vec<String>,
}

/// Reconcile a single rollforward line against its account's detail entries.
///
/// Every entry must carry the line's account code; an empty entry set means
/// the account is absent from the activity export.
pub fn reconcile_line(
    line: &RollforwardLine,
    entries: &[ActivityDetailEntry],
) -> CloseResult<ReconLine> {
    validate_line(line)?;
    if entries.is_empty() {
        return Err(CloseError::MissingAccount(line.account_code.clone()));
    }
    for entry in entries {
        if entry.account_code != line.account_code {
            return Err(CloseError::InvalidInput {
                field: "account_code".into(),
                reason: format!(
                    "Entry for account {} passed against rollforward line {}",
                    entry.account_code, line.account_code
                ),
            });
        }
    }

    let by_account = aggregate(entries)?;
    let activity = by_account
        .get(&line.account_code)
        .cloned()
        .unwrap_or_default();
    Ok(build_line(line, &activity))
}

fn build_line(line: &RollforwardLine, activity: &AccountActivity) -> ReconLine {
    let rf_change = net_change_rollforward(line);
    let act_change = activity.net_change();
    ReconLine {
        account_code: line.account_code.clone(),
        net_change_rollforward: rf_change,
        net_change_activity: act_change,
        net_difference: rf_change - act_change,
        disposals_variance: activity.disposals_total - line.disposals.abs(),
    }
}

/// Reconcile two full exports for the same period.
///
/// Accounts are outer-joined by code; an account present on only one side is
/// carried with the absent side at zero and reported as a warning.
/// Construction-in-progress lines are excluded from the comparison set and
/// summarized separately — they have no activity-detail counterpart.
pub fn reconcile_reports(
    rollforward: &RollforwardReport,
    activity: &ActivityReport,
) -> CloseResult<ComputationOutput<FixedAssetRecon>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if rollforward.period != activity.period {
        return Err(CloseError::PeriodMismatch {
            left: rollforward.period.clone(),
            right: activity.period.clone(),
        });
    }

    let mut rf_by_account: BTreeMap<&str, &RollforwardLine> = BTreeMap::new();
    let mut cip_codes: Vec<String> = Vec::new();
    let mut cip_movement = Decimal::ZERO;

    for line in &rollforward.lines {
        validate_line(line)?;
        if line.asset_class == AssetClass::ConstructionInProgress {
            cip_codes.push(line.account_code.clone());
            cip_movement += net_change_rollforward(line);
            continue;
        }
        if rf_by_account.insert(&line.account_code, line).is_some() {
            return Err(CloseError::InvalidInput {
                field: "account_code".into(),
                reason: format!(
                    "Account {} appears more than once in the rollforward",
                    line.account_code
                ),
            });
        }
        let residual = check_tie(line);
        if residual.abs() > CENT_TOLERANCE {
            warnings.push(format!(
                "Rollforward line {} does not tie: residual {}",
                line.account_code, residual
            ));
        }
    }

    if !cip_codes.is_empty() {
        warnings.push(format!(
            "CIP accounts excluded from comparison: {}",
            cip_codes.join(", ")
        ));
    }

    let act_by_account = aggregate(&activity.entries)?;

    // Activity posted under CIP accounts is held out of the comparison with
    // the rollforward side, but must still be surfaced.
    let mut cip_activity = Decimal::ZERO;
    let mut cip_activity_codes: Vec<String> = Vec::new();
    for code in &cip_codes {
        if let Some(act) = act_by_account.get(code) {
            cip_activity += act.net_change();
            cip_activity_codes.push(code.clone());
        }
    }
    if !cip_activity_codes.is_empty() {
        warnings.push(format!(
            "Activity entries under CIP accounts held out of comparison: {} (net change {})",
            cip_activity_codes.join(", "),
            cip_activity
        ));
    }

    let mut lines = Vec::new();
    let mut totals = ReconTotals::default();
    let mut missing_from_activity = Vec::new();
    let mut missing_from_rollforward = Vec::new();

    let mut accounts: Vec<&str> = rf_by_account.keys().copied().collect();
    for code in act_by_account.keys() {
        if !rf_by_account.contains_key(code.as_str()) && !cip_codes.contains(code) {
            accounts.push(code);
        }
    }
    accounts.sort_unstable();

    let empty_activity = AccountActivity::default();
    let zero_line = |code: &str| RollforwardLine {
        account_code: code.to_string(),
        description: None,
        asset_class: AssetClass::Depreciable,
        beginning_cost: Decimal::ZERO,
        additions: Decimal::ZERO,
        transfers: Decimal::ZERO,
        disposals: Decimal::ZERO,
        ending_cost: Decimal::ZERO,
    };

    for code in accounts {
        let recon = match (rf_by_account.get(code), act_by_account.get(code)) {
            (Some(line), Some(act)) => build_line(line, act),
            (Some(line), None) => {
                missing_from_activity.push(code.to_string());
                build_line(line, &empty_activity)
            }
            (None, Some(act)) => {
                missing_from_rollforward.push(code.to_string());
                build_line(&zero_line(code), act)
            }
            (None, None) => continue,
        };
        totals.net_change_rollforward += recon.net_change_rollforward;
        totals.net_change_activity += recon.net_change_activity;
        totals.net_difference += recon.net_difference;
        totals.disposals_variance += recon.disposals_variance;
        lines.push(recon);
    }

    if !missing_from_activity.is_empty() {
        warnings.push(format!(
            "Accounts absent from the activity export: {}",
            missing_from_activity.join(", ")
        ));
    }
    if !missing_from_rollforward.is_empty() {
        warnings.push(format!(
            "Accounts absent from the rollforward export: {}",
            missing_from_rollforward.join(", ")
        ));
    }

    let issue_count = lines
        .iter()
        .filter(|l| l.net_difference.abs() > CENT_TOLERANCE)
        .count();

    let cip = if cip_codes.is_empty() {
        None
    } else {
        Some(CipSummary {
            account_codes: cip_codes,
            net_movement: cip_movement,
            activity_net_change: cip_activity,
        })
    };

    let result = FixedAssetRecon {
        period: rollforward.period.clone(),
        lines,
        totals,
        issue_count,
        cip,
        missing_from_activity,
        missing_from_rollforward,
    };

    let assumptions = json!({
        "tie_tolerance": CENT_TOLERANCE,
        "disposal_sign_convention": "rollforward signed negative, activity unsigned",
        "join_key": "account_code",
    });

    Ok(with_metadata(
        "Fixed-asset rollforward vs activity-by-year reconciliation at account level",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_assets::activity::ActivityCategory;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn line_15070() -> RollforwardLine {
        RollforwardLine {
            account_code: "15070".into(),
            description: Some("Buildings & improvements".into()),
            asset_class: AssetClass::Depreciable,
            beginning_cost: dec!(27938169.33),
            additions: dec!(4308320.99),
            transfers: Decimal::ZERO,
            disposals: dec!(-1650013.88),
            ending_cost: dec!(30596476.44),
        }
    }

    fn line_15130() -> RollforwardLine {
        RollforwardLine {
            account_code: "15130".into(),
            description: Some("Machinery & equipment".into()),
            asset_class: AssetClass::Depreciable,
            beginning_cost: dec!(16378798.25),
            additions: dec!(1052216.55),
            transfers: Decimal::ZERO,
            disposals: dec!(-515271.36),
            ending_cost: dec!(16915743.44),
        }
    }

    fn entry(
        account: &str,
        category: ActivityCategory,
        acquired_and_disposed: bool,
        amount: Money,
    ) -> ActivityDetailEntry {
        ActivityDetailEntry {
            account_code: account.into(),
            category,
            acquired_and_disposed,
            amount,
        }
    }

    fn entries_15070() -> Vec<ActivityDetailEntry> {
        vec![
            entry("15070", ActivityCategory::Additions, false, dec!(4129044.84)),
            entry("15070", ActivityCategory::Disposals, true, dec!(140805.00)),
            entry("15070", ActivityCategory::Disposals, false, dec!(1650013.88)),
        ]
    }

    fn entries_15130() -> Vec<ActivityDetailEntry> {
        vec![
            entry("15130", ActivityCategory::Additions, false, dec!(1034666.85)),
            entry("15130", ActivityCategory::Disposals, true, dec!(19549.70)),
            entry("15130", ActivityCategory::Disposals, false, dec!(515271.36)),
        ]
    }

    #[test]
    fn test_account_15070_vector() {
        let recon = reconcile_line(&line_15070(), &entries_15070()).unwrap();
        assert_eq!(recon.net_change_rollforward, dec!(2658307.11));
        assert_eq!(recon.net_change_activity, dec!(2619835.96));
        assert_eq!(recon.net_difference, dec!(38471.15));
        assert_eq!(recon.disposals_variance, dec!(0.00));
    }

    #[test]
    fn test_account_15130_vector() {
        let recon = reconcile_line(&line_15130(), &entries_15130()).unwrap();
        assert_eq!(recon.net_change_rollforward, dec!(536945.19));
        assert_eq!(recon.net_change_activity, dec!(538945.19));
        assert_eq!(recon.net_difference, dec!(-2000.00));
        assert_eq!(recon.disposals_variance, dec!(0.00));
    }

    #[test]
    fn test_net_difference_antisymmetric_under_baseline_swap() {
        let recon = reconcile_line(&line_15070(), &entries_15070()).unwrap();
        let swapped = recon.net_change_activity - recon.net_change_rollforward;
        assert_eq!(swapped, -recon.net_difference);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let first = reconcile_line(&line_15070(), &entries_15070()).unwrap();
        let second = reconcile_line(&line_15070(), &entries_15070()).unwrap();
        assert_eq!(first.net_difference, second.net_difference);
        assert_eq!(first.disposals_variance, second.disposals_variance);
    }

    #[test]
    fn test_empty_entry_set_is_missing_account() {
        let err = reconcile_line(&line_15070(), &[]).unwrap_err();
        assert!(matches!(err, CloseError::MissingAccount(code) if code == "15070"));
    }

    #[test]
    fn test_disposal_sign_normalization() {
        // A rollforward carrying disposals at -1,650,013.88 and an activity
        // disposal total of 1,650,013.88 describe the same removals; the
        // variance must be zero, not twice the amount.
        let recon = reconcile_line(&line_15070(), &entries_15070()).unwrap();
        assert_eq!(recon.disposals_variance, Decimal::ZERO);
    }

    fn full_reports() -> (RollforwardReport, ActivityReport) {
        let rollforward = RollforwardReport {
            period: "FY2024".into(),
            lines: vec![
                line_15070(),
                line_15130(),
                RollforwardLine {
                    account_code: "15900".into(),
                    description: Some("Construction in progress".into()),
                    asset_class: AssetClass::ConstructionInProgress,
                    beginning_cost: dec!(250000.00),
                    additions: dec!(410000.00),
                    transfers: dec!(-300000.00),
                    disposals: Decimal::ZERO,
                    ending_cost: dec!(360000.00),
                },
            ],
        };
        let mut entries = entries_15070();
        entries.extend(entries_15130());
        let activity = ActivityReport {
            period: "FY2024".into(),
            entries,
        };
        (rollforward, activity)
    }

    #[test]
    fn test_full_reconciliation_totals() {
        let (rollforward, activity) = full_reports();
        let output = reconcile_reports(&rollforward, &activity).unwrap();
        let recon = &output.result;

        assert_eq!(recon.lines.len(), 2, "CIP must not enter the comparison set");
        assert_eq!(recon.totals.net_difference, dec!(36471.15));
        assert_eq!(recon.issue_count, 2);

        let cip = recon.cip.as_ref().unwrap();
        assert_eq!(cip.account_codes, vec!["15900".to_string()]);
        assert_eq!(cip.net_movement, dec!(110000.00));
        assert_eq!(cip.activity_net_change, Decimal::ZERO);
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("CIP accounts excluded")));
    }

    #[test]
    fn test_cip_activity_surfaced_not_compared() {
        // An addition posted under the CIP account must stay out of the
        // comparison lines and totals, but show up in the CIP summary and
        // a warning rather than vanish.
        let (rollforward, mut activity) = full_reports();
        activity.entries.push(entry(
            "15900",
            ActivityCategory::Additions,
            false,
            dec!(50000.00),
        ));

        let output = reconcile_reports(&rollforward, &activity).unwrap();
        let recon = &output.result;

        assert_eq!(recon.lines.len(), 2);
        assert!(recon.lines.iter().all(|l| l.account_code != "15900"));
        assert!(recon.missing_from_rollforward.is_empty());
        assert_eq!(recon.totals.net_change_activity, dec!(3158781.15));

        let cip = recon.cip.as_ref().unwrap();
        assert_eq!(cip.activity_net_change, dec!(50000.00));
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("Activity entries under CIP accounts")
                && w.contains("15900")
                && w.contains("50000.00")));
    }

    #[test]
    fn test_period_mismatch_rejected() {
        let (rollforward, mut activity) = full_reports();
        activity.period = "FY2023".into();
        let err = reconcile_reports(&rollforward, &activity).unwrap_err();
        assert!(matches!(err, CloseError::PeriodMismatch { .. }));
    }

    #[test]
    fn test_one_sided_accounts_carried_at_zero() {
        let (mut rollforward, mut activity) = full_reports();
        rollforward.lines.retain(|l| l.account_code != "15130");
        activity.entries.push(entry(
            "15210",
            ActivityCategory::Additions,
            false,
            dec!(5000.00),
        ));

        let output = reconcile_reports(&rollforward, &activity).unwrap();
        let recon = &output.result;

        assert_eq!(recon.missing_from_rollforward, vec!["15130", "15210"]);
        assert!(recon.missing_from_activity.is_empty());

        let orphan = recon
            .lines
            .iter()
            .find(|l| l.account_code == "15210")
            .unwrap();
        assert_eq!(orphan.net_change_rollforward, Decimal::ZERO);
        assert_eq!(orphan.net_difference, dec!(-5000.00));
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("absent from the rollforward")));
    }

    #[test]
    fn test_untied_line_warns() {
        let (mut rollforward, activity) = full_reports();
        rollforward.lines[0].additions += dec!(100.00);
        let output = reconcile_reports(&rollforward, &activity).unwrap();
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("15070") && w.contains("does not tie")));
    }
}
