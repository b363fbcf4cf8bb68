use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CloseError;
use crate::types::{Money, Period};
use crate::CloseResult;

/// Which detail listing an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityCategory {
    Additions,
    Disposals,
}

/// One line from an activity-by-year detail export. Amounts are unsigned.
///
/// A `Disposals` entry with `acquired_and_disposed` set is the nested
/// "Acquisitions" subtotal: cost of assets acquired and disposed within the
/// same period. The additions listing omits those by definition, so they are
/// added back when computing gross acquisitions, and they do not count as
/// disposal amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityDetailEntry {
    /// Account code, e.g. "15070"
    pub account_code: String,
    pub category: ActivityCategory,
    #[serde(default)]
    pub acquired_and_disposed: bool,
    pub amount: Money,
}

/// A full activity-by-year export for one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityReport {
    pub period: Period,
    pub entries: Vec<ActivityDetailEntry>,
}

/// Per-account activity totals after aggregation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountActivity {
    pub additions_total: Money,
    /// In-year acquired-and-disposed cost, added back to gross acquisitions
    pub acquisitions_addback: Money,
    pub disposals_total: Money,
}

impl AccountActivity {
    /// Net change under the activity convention:
    /// additions + acquired-and-disposed add-back - disposals.
    pub fn net_change(&self) -> Money {
        self.additions_total + self.acquisitions_addback - self.disposals_total
    }

    fn absorb(&mut self, entry: &ActivityDetailEntry) {
        match (entry.category, entry.acquired_and_disposed) {
            (ActivityCategory::Additions, _) => self.additions_total += entry.amount,
            (ActivityCategory::Disposals, true) => self.acquisitions_addback += entry.amount,
            (ActivityCategory::Disposals, false) => self.disposals_total += entry.amount,
        }
    }
}

/// Net change for one account's entry set. All entries must share an
/// account code.
pub fn net_change_activity(entries: &[ActivityDetailEntry]) -> CloseResult<Money> {
    let mut totals = AccountActivity::default();
    let mut account: Option<&str> = None;

    for entry in entries {
        validate_entry(entry)?;
        match account {
            None => account = Some(&entry.account_code),
            Some(code) if code != entry.account_code => {
                return Err(CloseError::InvalidInput {
                    field: "account_code".into(),
                    reason: format!(
                        "Entry set mixes accounts {} and {}",
                        code, entry.account_code
                    ),
                });
            }
            Some(_) => {}
        }
        totals.absorb(entry);
    }

    Ok(totals.net_change())
}

/// Aggregate a full detail export into per-account totals, preserving
/// account-code order.
pub(crate) fn aggregate(
    entries: &[ActivityDetailEntry],
) -> CloseResult<BTreeMap<String, AccountActivity>> {
    let mut by_account: BTreeMap<String, AccountActivity> = BTreeMap::new();
    for entry in entries {
        validate_entry(entry)?;
        by_account
            .entry(entry.account_code.clone())
            .or_default()
            .absorb(entry);
    }
    Ok(by_account)
}

fn validate_entry(entry: &ActivityDetailEntry) -> CloseResult<()> {
    if entry.account_code.trim().is_empty() {
        return Err(CloseError::InvalidInput {
            field: "account_code".into(),
            reason: "Activity entry has an empty account code".into(),
        });
    }
    if entry.amount < Decimal::ZERO {
        return Err(CloseError::InvalidInput {
            field: "amount".into(),
            reason: format!(
                "Activity amounts are unsigned; account {} carries {}",
                entry.account_code, entry.amount
            ),
        });
    }
    Ok(())
}
