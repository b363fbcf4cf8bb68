//! Month-end close calendar.
//!
//! Builds the close schedule for an accounting period: the cutoff day (last
//! weekday of the month) plus the first seven business days of the following
//! month, each with its close tasks, and renders the schedule as the
//! department's Markdown memo.

pub mod schedule;

pub use schedule::{
    build_schedule, render_email_markdown, CloseCalendarInput, CloseMilestone, CloseSchedule,
    CloseSystems,
};
