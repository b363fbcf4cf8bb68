use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::CloseError;
use crate::types::{with_metadata, ComputationOutput, Money, Period, CENT_TOLERANCE};
use crate::CloseResult;

/// Classification of a rollforward line for comparability.
///
/// Construction-in-progress is a non-depreciable holding bucket with no
/// counterpart in the activity-by-year detail, so it cannot be compared
/// against category-level activity lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetClass {
    #[default]
    Depreciable,
    ConstructionInProgress,
}

/// One account line from a fixed-asset rollforward export.
///
/// Disposals are signed: a reduction in cost is negative. The line ties when
/// beginning + additions + transfers + disposals equals ending within a cent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollforwardLine {
    /// Account code, e.g. "15070"
    pub account_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub asset_class: AssetClass,
    pub beginning_cost: Money,
    pub additions: Money,
    pub transfers: Money,
    /// Signed; negative for cost removed from the account
    pub disposals: Money,
    pub ending_cost: Money,
}

/// A full rollforward export for one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollforwardReport {
    pub period: Period,
    pub lines: Vec<RollforwardLine>,
}

/// Net change in cost over the period: ending minus beginning.
pub fn net_change_rollforward(line: &RollforwardLine) -> Money {
    line.ending_cost - line.beginning_cost
}

/// Residual of the rollforward identity:
/// beginning + additions + transfers + disposals - ending.
pub fn check_tie(line: &RollforwardLine) -> Money {
    line.beginning_cost + line.additions + line.transfers + line.disposals - line.ending_cost
}

/// Whether the line's rollforward identity holds within rounding tolerance.
pub fn ties(line: &RollforwardLine) -> bool {
    check_tie(line).abs() <= CENT_TOLERANCE
}

/// Tie residual for one report line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TieCheckLine {
    pub account_code: String,
    pub residual: Money,
    pub ties: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TieCheck {
    pub period: Period,
    pub line_count: usize,
    pub untied_count: usize,
    pub lines: Vec<TieCheckLine>,
}

/// Run the rollforward identity over every line of a report.
pub fn check_report_ties(report: &RollforwardReport) -> CloseResult<ComputationOutput<TieCheck>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let mut lines = Vec::with_capacity(report.lines.len());
    for line in &report.lines {
        validate_line(line)?;
        let residual = check_tie(line);
        let tied = ties(line);
        if !tied {
            warnings.push(format!(
                "Rollforward line {} does not tie: residual {}",
                line.account_code, residual
            ));
        }
        lines.push(TieCheckLine {
            account_code: line.account_code.clone(),
            residual,
            ties: tied,
        });
    }

    let untied_count = lines.iter().filter(|l| !l.ties).count();
    let result = TieCheck {
        period: report.period.clone(),
        line_count: lines.len(),
        untied_count,
        lines,
    };

    let assumptions = json!({
        "identity": "beginning + additions + transfers + disposals = ending",
        "tolerance": CENT_TOLERANCE,
    });

    Ok(with_metadata(
        "Rollforward identity check per account line",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    ))
}

pub(crate) fn validate_line(line: &RollforwardLine) -> CloseResult<()> {
    if line.account_code.trim().is_empty() {
        return Err(CloseError::InvalidInput {
            field: "account_code".into(),
            reason: "Rollforward line has an empty account code".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn tying_line() -> RollforwardLine {
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

    #[test]
    fn test_net_change_is_ending_minus_beginning() {
        let line = tying_line();
        assert_eq!(net_change_rollforward(&line), dec!(2658307.11));
    }

    #[test]
    fn test_tie_residual_zero_for_consistent_line() {
        let line = tying_line();
        assert_eq!(check_tie(&line), Decimal::ZERO);
        assert!(ties(&line));
    }

    #[test]
    fn test_tie_tolerance_is_one_cent() {
        let mut line = tying_line();
        line.ending_cost += dec!(0.01);
        assert!(ties(&line), "a one-cent residual is within tolerance");

        line.ending_cost += dec!(0.01);
        assert!(!ties(&line), "a two-cent residual is out of tolerance");
    }

    #[test]
    fn test_empty_account_code_rejected() {
        let mut line = tying_line();
        line.account_code = "  ".into();
        assert!(validate_line(&line).is_err());
    }

    #[test]
    fn test_report_tie_check_flags_untied_lines() {
        let mut broken = tying_line();
        broken.account_code = "15130".into();
        broken.ending_cost += dec!(25.00);
        let report = RollforwardReport {
            period: "FY2024".into(),
            lines: vec![tying_line(), broken],
        };

        let output = check_report_ties(&report).unwrap();
        let check = &output.result;

        assert_eq!(check.line_count, 2);
        assert_eq!(check.untied_count, 1);
        assert!(check.lines[0].ties);
        assert!(!check.lines[1].ties);
        assert_eq!(check.lines[1].residual, dec!(-25.00));
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("15130") && w.contains("does not tie")));
    }
}
