use std::time::Instant;

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::CloseError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::CloseResult;

/// Inputs for a fixed-rate, monthly-payment loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: Money,
    /// Annual rate as a fraction (0.065 = 6.5%)
    pub annual_rate: Rate,
    pub term_months: u32,
    /// First payment date; subsequent payments step by calendar month
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// One payment row of the schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub monthly_payment: Money,
    pub rows: Vec<AmortizationRow>,
    pub total_paid: Money,
    pub total_interest: Money,
}

/// Level annuity payment. Falls back to straight division at zero rate.
pub fn monthly_payment(
    principal: Money,
    annual_rate: Rate,
    term_months: u32,
) -> CloseResult<Money> {
    if term_months == 0 {
        return Err(CloseError::InvalidInput {
            field: "term_months".into(),
            reason: "Loan term must be positive".into(),
        });
    }
    let monthly_rate = annual_rate / Decimal::from(12);
    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(term_months));
    }
    let factor = (Decimal::ONE + monthly_rate).powd(Decimal::from(term_months));
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(CloseError::DivisionByZero {
            context: "annuity payment factor".into(),
        });
    }
    Ok(principal * monthly_rate * factor / denominator)
}

fn validate(input: &LoanInput) -> CloseResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(CloseError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if input.term_months == 0 {
        return Err(CloseError::InvalidInput {
            field: "term_months".into(),
            reason: "Loan term must be positive".into(),
        });
    }
    if input.annual_rate < Decimal::ZERO {
        return Err(CloseError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Annual rate cannot be negative".into(),
        });
    }
    Ok(())
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    // First of next month minus one day
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .map(|d| d.pred_opt().map(|p| p.day()).unwrap_or(28))
        .unwrap_or(28)
}

/// Step a date forward by whole months, clamping the day to the shorter
/// target month (Jan 31 + 1 month = Feb 28/29).
pub(crate) fn add_months(date: NaiveDate, months: u32) -> CloseResult<NaiveDate> {
    let zero_based = date.month0() + months;
    let year = date.year() + (zero_based / 12) as i32;
    let month = zero_based % 12 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| CloseError::DateError(format!("Cannot step {} by {} months", date, months)))
}

/// Build the full payment schedule. Per-row interest is rounded to cents and
/// the final payment is trued up so the balance closes to exactly zero.
pub fn build_schedule(input: &LoanInput) -> CloseResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    validate(input)?;

    let monthly_rate = input.annual_rate / Decimal::from(12);
    let payment = monthly_payment(input.principal, input.annual_rate, input.term_months)?
        .round_dp(2);

    let mut rows = Vec::with_capacity(input.term_months as usize);
    let mut balance = input.principal;
    let mut total_paid = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;

    for period in 1..=input.term_months {
        let interest = (balance * monthly_rate).round_dp(2);
        let mut principal_part = payment - interest;
        let mut row_payment = payment;

        // Last period, or a drift that would overshoot: close out the balance.
        if period == input.term_months || principal_part > balance {
            principal_part = balance;
            row_payment = interest + principal_part;
        }
        balance -= principal_part;

        let payment_date = match input.start_date {
            Some(start_date) => Some(add_months(start_date, period - 1)?),
            None => None,
        };

        total_paid += row_payment;
        total_interest += interest;
        rows.push(AmortizationRow {
            period,
            payment_date,
            payment: row_payment,
            interest,
            principal: principal_part,
            balance,
        });

        if balance.is_zero() {
            break;
        }
    }

    let result = AmortizationSchedule {
        monthly_payment: payment,
        rows,
        total_paid,
        total_interest,
    };

    let assumptions = json!({
        "compounding": "monthly",
        "rate_convention": "annual fraction, e.g. 0.065",
        "rounding": "interest and payment rounded to cents per period",
    });

    Ok(with_metadata(
        "Level-payment amortization with final-payment true-up",
        &assumptions,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        result,
    ))
}
