use std::collections::BTreeSet;
use std::time::Instant;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::CloseError;
use crate::types::{with_metadata, ComputationOutput};
use crate::CloseResult;

const BUSINESS_DAYS_IN_CLOSE: usize = 7;

/// Period and holiday calendar for the close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseCalendarInput {
    pub year: i32,
    /// 1-12
    pub month: u32,
    /// Dates skipped when counting business days
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

/// Names interpolated into the rendered memo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseSystems {
    pub erp: String,
    pub statements: String,
    pub warehouses: String,
    pub timezone_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Default for CloseSystems {
    fn default() -> Self {
        CloseSystems {
            erp: "the ERP".into(),
            statements: "the statement system".into(),
            warehouses: "all warehouses".into(),
            timezone_label: "local time".into(),
            signature: None,
        }
    }
}

/// One dated step of the close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseMilestone {
    pub date: NaiveDate,
    /// None for the month-end cutoff day, 1-based afterwards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_day: Option<u8>,
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseSchedule {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    /// Last weekday of the closing month
    pub cutoff_day: NaiveDate,
    pub milestones: Vec<CloseMilestone>,
}

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month - 1) as usize]
}

fn last_day_of_month(year: i32, month: u32) -> CloseResult<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| CloseError::DateError(format!("No calendar for {}-{:02}", year, month)))
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn fmt_long(date: NaiveDate) -> String {
    format!(
        "{}, {} {}",
        day_name(date.weekday()),
        month_name(date.month()),
        date.day()
    )
}

fn fmt_month_day(date: NaiveDate) -> String {
    format!("{} {}", month_name(date.month()), date.day())
}

/// Build the close schedule for one period.
pub fn build_schedule(
    input: &CloseCalendarInput,
    systems: &CloseSystems,
) -> CloseResult<ComputationOutput<CloseSchedule>> {
    let start = Instant::now();

    if !(1..=12).contains(&input.month) {
        return Err(CloseError::InvalidInput {
            field: "month".into(),
            reason: format!("Month must be 1-12, got {}", input.month),
        });
    }

    let holidays: BTreeSet<NaiveDate> = input.holidays.iter().copied().collect();

    // Cutoff: last weekday of the closing month.
    let mut cutoff = last_day_of_month(input.year, input.month)?;
    while is_weekend(cutoff) {
        cutoff -= Duration::days(1);
    }

    // First seven business days of the following month.
    let (next_year, next_month) = if input.month == 12 {
        (input.year + 1, 1)
    } else {
        (input.year, input.month + 1)
    };
    let mut business_days = Vec::with_capacity(BUSINESS_DAYS_IN_CLOSE);
    let mut day = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| CloseError::DateError(format!("No calendar for {}-{:02}", next_year, next_month)))?;
    while business_days.len() < BUSINESS_DAYS_IN_CLOSE {
        if !is_weekend(day) && !holidays.contains(&day) {
            business_days.push(day);
        }
        day += Duration::days(1);
    }

    let month_label = month_name(input.month);
    let tz = &systems.timezone_label;

    let mut milestones = vec![CloseMilestone {
        date: cutoff,
        business_day: None,
        tasks: vec![
            format!(
                "Freeze inventory for {} — 12noon {} — all users exit {} for 15 minutes",
                systems.warehouses, tz, systems.erp
            ),
            format!(
                "Physical inventory counts for {} entered in {}",
                systems.warehouses, systems.erp
            ),
            format!(
                "All deposits and cash receipts posted in {} before end of day",
                systems.erp
            ),
        ],
    }];

    let day_tasks: [Vec<String>; BUSINESS_DAYS_IN_CLOSE] = [
        vec![
            format!(
                "All remaining inventory counts completed first thing ({})",
                fmt_month_day(business_days[0])
            ),
            format!(
                "Adjust any counts from {} to reflect end-of-day balances",
                fmt_month_day(cutoff)
            ),
            "Review count variances in the morning".to_string(),
            format!("Process customer finance charges — 4pm {}", tz),
        ],
        vec![
            format!(
                "All sales orders with a {} ship date posted or changed by 3pm {}",
                month_label, tz
            ),
            format!("All invoice batches posted by 4pm {}", tz),
            format!(
                "Freeze remaining inventory — 4pm {} (all users exit {})",
                tz, systems.erp
            ),
            "Process monthly customer statements".to_string(),
            format!("All remaining cash receipts posted before 6pm {}", tz),
            format!("Perform month-end close procedures — 6pm {} until release", tz),
        ],
        vec!["Mail customer statements".to_string()],
        vec![format!(
            "A/P closed for {} — all invoices approved by 6pm {}",
            month_label, tz
        )],
        vec![
            "Review month-end financial balances".to_string(),
            "Preliminary trend report".to_string(),
        ],
        vec![format!("Upload trial balances to {}", systems.statements)],
        vec!["Issue financial statements".to_string()],
    ];

    for (i, (date, tasks)) in business_days.iter().zip(day_tasks).enumerate() {
        milestones.push(CloseMilestone {
            date: *date,
            business_day: Some((i + 1) as u8),
            tasks,
        });
    }

    let result = CloseSchedule {
        year: input.year,
        month: input.month,
        month_name: month_label.to_string(),
        cutoff_day: cutoff,
        milestones,
    };

    let assumptions = json!({
        "cutoff": "last weekday of the closing month",
        "business_days": BUSINESS_DAYS_IN_CLOSE,
        "holidays_skipped": input.holidays,
    });

    Ok(with_metadata(
        "Month-end close calendar: cutoff plus first seven business days",
        &assumptions,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        result,
    ))
}

/// Render the schedule as the close-memo Markdown circulated to the
/// department.
pub fn render_email_markdown(schedule: &CloseSchedule, systems: &CloseSystems) -> String {
    let mut md = Vec::new();

    md.push(format!(
        "# Month-end close schedule for {} {}\n",
        schedule.month_name, schedule.year
    ));
    md.push("Good morning,\n".to_string());
    md.push(format!(
        "Below is the month-end close schedule for {} {}. \
         Please review the schedule and plan accordingly.\n",
        schedule.month_name, schedule.year
    ));

    for milestone in &schedule.milestones {
        let heading = match milestone.business_day {
            None => format!("## {}\n", fmt_long(milestone.date)),
            Some(n) => format!("## {} (Business Day {})\n", fmt_long(milestone.date), n),
        };
        md.push(heading);
        for task in &milestone.tasks {
            md.push(format!("- {}", task));
        }
        md.push(String::new());
    }

    md.push("Thank you,\n".to_string());
    if let Some(signature) = &systems.signature {
        md.push(signature.clone());
    }

    md.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(year: i32, month: u32, holidays: Vec<NaiveDate>) -> CloseCalendarInput {
        CloseCalendarInput {
            year,
            month,
            holidays,
        }
    }

    #[test]
    fn test_cutoff_is_last_weekday() {
        // August 2026 ends on Monday the 31st.
        let output = build_schedule(&input(2026, 8, vec![]), &CloseSystems::default()).unwrap();
        assert_eq!(
            output.result.cutoff_day,
            NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()
        );

        // May 2026 ends on Sunday the 31st; cutoff rolls back to Friday the 29th.
        let output = build_schedule(&input(2026, 5, vec![]), &CloseSystems::default()).unwrap();
        assert_eq!(
            output.result.cutoff_day,
            NaiveDate::from_ymd_opt(2026, 5, 29).unwrap()
        );
    }

    #[test]
    fn test_business_days_skip_weekends() {
        // September 2026: Oct 1 is a Thursday; BD3 must skip the weekend.
        let output = build_schedule(&input(2026, 9, vec![]), &CloseSystems::default()).unwrap();
        let days: Vec<NaiveDate> = output
            .result
            .milestones
            .iter()
            .filter(|m| m.business_day.is_some())
            .map(|m| m.date)
            .collect();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(days[1], NaiveDate::from_ymd_opt(2026, 10, 2).unwrap());
        assert_eq!(days[2], NaiveDate::from_ymd_opt(2026, 10, 5).unwrap());
    }

    #[test]
    fn test_business_days_skip_holidays() {
        // New Year's Day lands on Business Day 1 of the December close.
        let new_years = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let output =
            build_schedule(&input(2026, 12, vec![new_years]), &CloseSystems::default()).unwrap();
        let first_bd = output
            .result
            .milestones
            .iter()
            .find(|m| m.business_day == Some(1))
            .unwrap()
            .date;
        assert_ne!(first_bd, new_years);
        // Jan 1 2027 is a Friday; next business day is Monday the 4th.
        assert_eq!(first_bd, NaiveDate::from_ymd_opt(2027, 1, 4).unwrap());
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let output = build_schedule(&input(2026, 12, vec![]), &CloseSystems::default()).unwrap();
        let first_bd = output
            .result
            .milestones
            .iter()
            .find(|m| m.business_day == Some(1))
            .unwrap()
            .date;
        assert_eq!(first_bd.year(), 2027);
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(build_schedule(&input(2026, 13, vec![]), &CloseSystems::default()).is_err());
        assert!(build_schedule(&input(2026, 0, vec![]), &CloseSystems::default()).is_err());
    }

    #[test]
    fn test_memo_names_systems_and_days() {
        let systems = CloseSystems {
            erp: "DM2".into(),
            statements: "NorthStar".into(),
            warehouses: "lube, agronomy, and feeds".into(),
            timezone_label: "MDT".into(),
            signature: Some("Accounting".into()),
        };
        let output = build_schedule(&input(2026, 8, vec![]), &systems).unwrap();
        let memo = render_email_markdown(&output.result, &systems);

        assert!(memo.contains("# Month-end close schedule for August 2026"));
        assert!(memo.contains("DM2"));
        assert!(memo.contains("NorthStar"));
        assert!(memo.contains("(Business Day 7)"));
        assert!(memo.contains("Issue financial statements"));
    }
}
