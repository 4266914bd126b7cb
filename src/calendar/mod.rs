//! Calendar rules: A/B day classification and recurring class expansion.
//!
//! # Weeks
//! Weeks run Monday to Sunday. A week anchor is any date inside the week;
//! expansion always resolves it to that week's Monday first.

mod ab_day;
mod expand;

pub use ab_day::{ab_day, ab_label_for_header, AbCalendar, WeekNumbering};
pub use expand::{date_in_week, derive_schedule, expand, week_start, Expander};
