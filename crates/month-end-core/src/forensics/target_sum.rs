use std::time::Instant;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::CloseError;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::CloseResult;

/// Search parameters. Amounts are usually one column of a detail export and
/// the target is an unreconciled difference being chased.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSumInput {
    pub amounts: Vec<Money>,
    pub target: Money,
    #[serde(default = "default_tolerance")]
    pub tolerance: Money,
    /// Maximum combination size
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Stop after this many matches; 0 = unlimited
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,
}

fn default_tolerance() -> Money {
    dec!(0.01)
}

fn default_max_size() -> usize {
    5
}

fn default_max_matches() -> usize {
    50
}

/// One combination of rows whose amounts sum to the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSumMatch {
    /// 0-based indices into the input amounts
    pub indices: Vec<usize>,
    pub amounts: Vec<Money>,
    pub total: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSumReport {
    pub matches: Vec<TargetSumMatch>,
    pub match_count: usize,
    /// True when the search stopped at max_matches
    pub truncated: bool,
}

fn to_cents(amount: Money, field: &str) -> CloseResult<i64> {
    (amount * dec!(100))
        .round_dp(0)
        .to_i64()
        .ok_or_else(|| CloseError::InvalidInput {
            field: field.into(),
            reason: format!("Amount {} does not fit integer cents", amount),
        })
}

/// Backtracking search over amounts converted to integer cents.
///
/// Values are sorted ascending so the search can stop a branch as soon as
/// the running sum overshoots the target; that early exit is only sound when
/// no amount is negative, so credits in the column disable pruning.
pub fn find_target_sums(input: &TargetSumInput) -> CloseResult<ComputationOutput<TargetSumReport>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.amounts.is_empty() {
        return Err(CloseError::InsufficientData(
            "No amounts to search".into(),
        ));
    }
    if input.max_size == 0 {
        return Err(CloseError::InvalidInput {
            field: "max_size".into(),
            reason: "Combination size must be at least 1".into(),
        });
    }
    if input.tolerance < Decimal::ZERO {
        return Err(CloseError::InvalidInput {
            field: "tolerance".into(),
            reason: "Tolerance cannot be negative".into(),
        });
    }

    let target = to_cents(input.target, "target")?;
    let tolerance = to_cents(input.tolerance, "tolerance")?;

    let mut values: Vec<(i64, usize)> = Vec::with_capacity(input.amounts.len());
    for (index, amount) in input.amounts.iter().enumerate() {
        values.push((to_cents(*amount, "amounts")?, index));
    }
    values.sort_unstable();

    let can_prune = values.first().map(|&(v, _)| v >= 0).unwrap_or(true);
    if !can_prune {
        warnings.push(
            "Negative amounts present; overshoot pruning disabled, search may be slow".into(),
        );
    }

    struct Search<'a> {
        values: &'a [(i64, usize)],
        target: i64,
        tolerance: i64,
        max_size: usize,
        max_matches: usize,
        can_prune: bool,
        matches: Vec<Vec<usize>>,
        truncated: bool,
    }

    impl Search<'_> {
        fn full(&self) -> bool {
            self.max_matches != 0 && self.matches.len() >= self.max_matches
        }

        fn backtrack(&mut self, from: usize, sum: i64, path: &mut Vec<usize>) {
            if self.full() {
                self.truncated = true;
                return;
            }
            if !path.is_empty() && (sum - self.target).abs() <= self.tolerance {
                self.matches.push(path.clone());
                return;
            }
            if path.len() == self.max_size {
                return;
            }
            for i in from..self.values.len() {
                let (value, _) = self.values[i];
                let next = sum + value;
                if self.can_prune && next - self.target > self.tolerance {
                    break;
                }
                path.push(i);
                self.backtrack(i + 1, next, path);
                path.pop();
                if self.full() {
                    self.truncated = true;
                    return;
                }
            }
        }
    }

    let mut search = Search {
        values: &values,
        target,
        tolerance,
        max_size: input.max_size,
        max_matches: input.max_matches,
        can_prune,
        matches: Vec::new(),
        truncated: false,
    };
    let mut path = Vec::new();
    search.backtrack(0, 0, &mut path);

    let matches: Vec<TargetSumMatch> = search
        .matches
        .iter()
        .map(|positions| {
            let mut indices: Vec<usize> =
                positions.iter().map(|&p| values[p].1).collect();
            indices.sort_unstable();
            let amounts: Vec<Money> = indices.iter().map(|&i| input.amounts[i]).collect();
            let total = amounts.iter().copied().sum();
            TargetSumMatch {
                indices,
                amounts,
                total,
            }
        })
        .collect();

    let result = TargetSumReport {
        match_count: matches.len(),
        truncated: search.truncated,
        matches,
    };

    let assumptions = json!({
        "units": "integer cents",
        "tolerance": input.tolerance,
        "max_size": input.max_size,
        "max_matches": input.max_matches,
    });

    Ok(with_metadata(
        "Backtracking subset search for amounts explaining a target difference",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(amounts: Vec<Money>, target: Money) -> TargetSumInput {
        TargetSumInput {
            amounts,
            target,
            tolerance: default_tolerance(),
            max_size: default_max_size(),
            max_matches: default_max_matches(),
        }
    }

    #[test]
    fn test_finds_exact_pair() {
        let amounts = vec![dec!(1200.00), dec!(1045.35), dec!(980.00), dec!(1200.00)];
        let output = find_target_sums(&input(amounts, dec!(2245.35))).unwrap();
        let report = &output.result;

        assert!(report.match_count >= 1);
        let found = report
            .matches
            .iter()
            .any(|m| m.total == dec!(2245.35) && m.indices.contains(&1));
        assert!(found, "1,200.00 + 1,045.35 should explain the target");
    }

    #[test]
    fn test_single_amount_match() {
        let amounts = vec![dec!(38471.15), dec!(12.00)];
        let output = find_target_sums(&input(amounts, dec!(38471.15))).unwrap();
        assert_eq!(output.result.matches[0].indices, vec![0]);
    }

    #[test]
    fn test_tolerance_admits_near_miss() {
        let amounts = vec![dec!(99.99)];
        let output = find_target_sums(&input(amounts, dec!(100.00))).unwrap();
        assert_eq!(output.result.match_count, 1);
    }

    #[test]
    fn test_no_match_beyond_tolerance() {
        let amounts = vec![dec!(99.97)];
        let output = find_target_sums(&input(amounts, dec!(100.00))).unwrap();
        assert_eq!(output.result.match_count, 0);
    }

    #[test]
    fn test_max_matches_truncates() {
        // Ten equal amounts, target equal to one of them: many single and
        // no larger matches; cap at 3.
        let amounts = vec![dec!(10.00); 10];
        let mut search_input = input(amounts, dec!(10.00));
        search_input.max_matches = 3;
        let output = find_target_sums(&search_input).unwrap();

        assert_eq!(output.result.match_count, 3);
        assert!(output.result.truncated);
    }

    #[test]
    fn test_negative_amounts_warn_and_still_match() {
        let amounts = vec![dec!(150.00), dec!(-50.00), dec!(25.00)];
        let output = find_target_sums(&input(amounts, dec!(100.00))).unwrap();

        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("pruning disabled")));
        let found = output
            .result
            .matches
            .iter()
            .any(|m| m.indices == vec![0, 1]);
        assert!(found, "150.00 - 50.00 should explain the target");
    }

    #[test]
    fn test_empty_amounts_rejected() {
        let err = find_target_sums(&input(vec![], dec!(1.00))).unwrap_err();
        assert!(matches!(err, CloseError::InsufficientData(_)));
    }
}
