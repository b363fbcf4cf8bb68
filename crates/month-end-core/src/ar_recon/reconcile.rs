use std::collections::BTreeMap;
use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::CloseError;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::CloseResult;

/// One open invoice line from an AR export (aging or trial-balance detail).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenInvoice {
    /// Customer number, e.g. "0000003"
    pub customer_id: String,
    pub customer_name: String,
    pub invoice_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<NaiveDate>,
    pub open_amount: Money,
}

/// Invoice-level variance row. Absent sides are carried at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceVariance {
    pub customer_id: String,
    pub customer_name: String,
    pub invoice_number: String,
    pub aged_open: Money,
    pub tb_open: Money,
    /// Aged minus trial balance
    pub variance: Money,
}

/// Customer-level variance row after rolling invoices up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerVariance {
    pub customer_id: String,
    pub customer_name: String,
    pub aged_open: Money,
    pub tb_open: Money,
    pub variance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArReconSummary {
    pub aged_total_open: Money,
    pub tb_total_open: Money,
    pub total_variance: Money,
    pub invoice_issue_count: usize,
    pub customer_issue_count: usize,
}

/// Full two-level reconciliation output. Only rows with a surviving variance
/// are listed; clean rows are reflected in the summary totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArRecon {
    pub summary: ArReconSummary,
    pub invoice_issues: Vec<InvoiceVariance>,
    pub customer_issues: Vec<CustomerVariance>,
}

#[derive(Default)]
struct Side {
    name: String,
    amount: Money,
}

fn validate(invoices: &[OpenInvoice], which: &str) -> CloseResult<()> {
    for inv in invoices {
        if inv.customer_id.trim().is_empty() {
            return Err(CloseError::InvalidInput {
                field: "customer_id".into(),
                reason: format!("{} invoice {} has no customer id", which, inv.invoice_number),
            });
        }
        if inv.invoice_number.trim().is_empty() {
            return Err(CloseError::InvalidInput {
                field: "invoice_number".into(),
                reason: format!("{} line for customer {} has no invoice number", which, inv.customer_id),
            });
        }
    }
    Ok(())
}

/// Reconcile an AR aging export against a trial-balance detail export.
pub fn reconcile_invoices(
    aged: &[OpenInvoice],
    trial_balance: &[OpenInvoice],
) -> CloseResult<ComputationOutput<ArRecon>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    validate(aged, "aging")?;
    validate(trial_balance, "trial balance")?;

    // Key: (customer_id, invoice_number). Duplicate invoice lines on one side
    // are summed, matching how the exports repeat partially-applied invoices.
    let mut joined: BTreeMap<(String, String), (Side, Side)> = BTreeMap::new();

    for inv in aged {
        let slot = joined
            .entry((inv.customer_id.clone(), inv.invoice_number.clone()))
            .or_default();
        slot.0.name = inv.customer_name.clone();
        slot.0.amount += inv.open_amount;
    }
    for inv in trial_balance {
        let slot = joined
            .entry((inv.customer_id.clone(), inv.invoice_number.clone()))
            .or_default();
        slot.1.name = inv.customer_name.clone();
        slot.1.amount += inv.open_amount;
    }

    let mut aged_total = Decimal::ZERO;
    let mut tb_total = Decimal::ZERO;
    let mut invoice_issues = Vec::new();
    let mut by_customer: BTreeMap<String, CustomerVariance> = BTreeMap::new();

    for ((customer_id, invoice_number), (aged_side, tb_side)) in &joined {
        aged_total += aged_side.amount;
        tb_total += tb_side.amount;

        let name = if aged_side.name.is_empty() {
            tb_side.name.clone()
        } else {
            aged_side.name.clone()
        };

        let customer = by_customer
            .entry(customer_id.clone())
            .or_insert_with(|| CustomerVariance {
                customer_id: customer_id.clone(),
                customer_name: name.clone(),
                aged_open: Decimal::ZERO,
                tb_open: Decimal::ZERO,
                variance: Decimal::ZERO,
            });
        customer.aged_open += aged_side.amount;
        customer.tb_open += tb_side.amount;

        let variance = aged_side.amount - tb_side.amount;
        if !variance.round_dp(2).is_zero() {
            invoice_issues.push(InvoiceVariance {
                customer_id: customer_id.clone(),
                customer_name: name,
                invoice_number: invoice_number.clone(),
                aged_open: aged_side.amount,
                tb_open: tb_side.amount,
                variance,
            });
        }
    }

    let mut customer_issues: Vec<CustomerVariance> = by_customer
        .into_values()
        .map(|mut c| {
            c.variance = c.aged_open - c.tb_open;
            c
        })
        .filter(|c| !c.variance.round_dp(2).is_zero())
        .collect();
    customer_issues.sort_by(|a, b| a.variance.cmp(&b.variance));

    let total_variance = aged_total - tb_total;
    if !total_variance.round_dp(2).is_zero() {
        warnings.push(format!(
            "Aging and trial balance totals differ by {}",
            total_variance
        ));
    }

    let result = ArRecon {
        summary: ArReconSummary {
            aged_total_open: aged_total,
            tb_total_open: tb_total,
            total_variance,
            invoice_issue_count: invoice_issues.len(),
            customer_issue_count: customer_issues.len(),
        },
        invoice_issues,
        customer_issues,
    };

    let assumptions = json!({
        "join_key": ["customer_id", "invoice_number"],
        "issue_threshold": "variance non-zero after rounding to cents",
        "absent_side": "carried at zero",
    });

    Ok(with_metadata(
        "AR aging vs trial-balance detail reconciliation at invoice and customer level",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn inv(customer_id: &str, name: &str, number: &str, amount: Money) -> OpenInvoice {
        OpenInvoice {
            customer_id: customer_id.into(),
            customer_name: name.into(),
            invoice_number: number.into(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 11, 14),
            open_amount: amount,
        }
    }

    #[test]
    fn test_matching_sides_produce_no_issues() {
        let aged = vec![
            inv("0000003", "Kalispell 3rd Ave", "INV-1001", dec!(1250.00)),
            inv("0000010", "Whitefish Depot", "INV-1002", dec!(88.40)),
        ];
        let output = reconcile_invoices(&aged, &aged.clone()).unwrap();
        let recon = &output.result;

        assert_eq!(recon.summary.total_variance, Decimal::ZERO);
        assert_eq!(recon.summary.invoice_issue_count, 0);
        assert_eq!(recon.summary.customer_issue_count, 0);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_amount_difference_flags_invoice_and_customer() {
        let aged = vec![inv("0000003", "Kalispell 3rd Ave", "INV-1001", dec!(1250.00))];
        let tb = vec![inv("0000003", "Kalispell 3rd Ave", "INV-1001", dec!(1240.00))];

        let output = reconcile_invoices(&aged, &tb).unwrap();
        let recon = &output.result;

        assert_eq!(recon.summary.total_variance, dec!(10.00));
        assert_eq!(recon.invoice_issues.len(), 1);
        assert_eq!(recon.invoice_issues[0].variance, dec!(10.00));
        assert_eq!(recon.customer_issues.len(), 1);
        assert_eq!(recon.customer_issues[0].variance, dec!(10.00));
        assert!(output.warnings.iter().any(|w| w.contains("differ by 10.00")));
    }

    #[test]
    fn test_one_sided_invoice_carried_at_zero() {
        let aged = vec![
            inv("0000003", "Kalispell 3rd Ave", "INV-1001", dec!(500.00)),
            inv("0000003", "Kalispell 3rd Ave", "INV-1005", dec!(75.25)),
        ];
        let tb = vec![inv("0000003", "Kalispell 3rd Ave", "INV-1001", dec!(500.00))];

        let output = reconcile_invoices(&aged, &tb).unwrap();
        let recon = &output.result;

        assert_eq!(recon.invoice_issues.len(), 1);
        let issue = &recon.invoice_issues[0];
        assert_eq!(issue.invoice_number, "INV-1005");
        assert_eq!(issue.tb_open, Decimal::ZERO);
        assert_eq!(issue.variance, dec!(75.25));
    }

    #[test]
    fn test_offsetting_invoices_net_clean_at_customer_level() {
        // Two invoice-level misses that offset: customer rollup is clean,
        // invoice detail still shows both.
        let aged = vec![
            inv("0000010", "Whitefish Depot", "INV-2001", dec!(100.00)),
            inv("0000010", "Whitefish Depot", "INV-2002", dec!(200.00)),
        ];
        let tb = vec![
            inv("0000010", "Whitefish Depot", "INV-2001", dec!(200.00)),
            inv("0000010", "Whitefish Depot", "INV-2002", dec!(100.00)),
        ];

        let output = reconcile_invoices(&aged, &tb).unwrap();
        let recon = &output.result;

        assert_eq!(recon.summary.invoice_issue_count, 2);
        assert_eq!(recon.summary.customer_issue_count, 0);
        assert_eq!(recon.summary.total_variance, Decimal::ZERO);
    }

    #[test]
    fn test_duplicate_lines_sum_before_comparison() {
        let aged = vec![
            inv("0000003", "Kalispell 3rd Ave", "INV-1001", dec!(300.00)),
            inv("0000003", "Kalispell 3rd Ave", "INV-1001", dec!(200.00)),
        ];
        let tb = vec![inv("0000003", "Kalispell 3rd Ave", "INV-1001", dec!(500.00))];

        let output = reconcile_invoices(&aged, &tb).unwrap();
        assert_eq!(output.result.summary.invoice_issue_count, 0);
    }

    #[test]
    fn test_missing_customer_id_rejected() {
        let aged = vec![inv("", "No Id", "INV-9", dec!(1.00))];
        assert!(reconcile_invoices(&aged, &[]).is_err());
    }
}
