//! A/B day classification.
//!
//! Monday and Wednesday are always A days, Tuesday and Thursday always B
//! days. Fridays alternate with the parity of the week number: even weeks
//! are A, odd weeks are B. Weekends carry no label.
//!
//! # Week Numbering
//! The Friday rule depends on how weeks are numbered, and the two common
//! conventions disagree around the turn of some years (2027-01-08 is ISO
//! week 1 but Sunday-start week 2). [`AbCalendar`] fixes one numbering so
//! that the per-date rule and the header label always agree.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::AbDay;

/// Week numbering convention for A/B parity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekNumbering {
    /// ISO-8601 weeks (Monday start, week 1 holds the first Thursday).
    #[default]
    Iso,
    /// Locale weeks: Sunday start, week 1 holds January 1st.
    SundayStart,
}

impl WeekNumbering {
    /// Week number of `date` under this convention.
    pub fn week_number(self, date: NaiveDate) -> u32 {
        match self {
            Self::Iso => date.iso_week().week(),
            Self::SundayStart => {
                let jan1 = date.with_ordinal(1).unwrap_or(date);
                let offset = jan1.weekday().num_days_from_sunday();
                (date.ordinal0() + offset) / 7 + 1
            }
        }
    }
}

/// A/B classifier bound to one week numbering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbCalendar {
    numbering: WeekNumbering,
}

impl AbCalendar {
    /// Creates a classifier with the given numbering.
    pub fn new(numbering: WeekNumbering) -> Self {
        Self { numbering }
    }

    /// The numbering in use.
    pub fn numbering(&self) -> WeekNumbering {
        self.numbering
    }

    /// A/B day from week-number parity: even is A, odd is B.
    pub fn ab_day(&self, date: NaiveDate) -> AbDay {
        if self.numbering.week_number(date) % 2 == 0 {
            AbDay::A
        } else {
            AbDay::B
        }
    }

    /// Label shown in the calendar column header for `date`.
    ///
    /// `None` is the empty label of Saturday and Sunday.
    pub fn label_for_header(&self, date: NaiveDate) -> Option<AbDay> {
        match date.weekday() {
            Weekday::Mon | Weekday::Wed => Some(AbDay::A),
            Weekday::Tue | Weekday::Thu => Some(AbDay::B),
            Weekday::Fri => Some(self.ab_day(date)),
            Weekday::Sat | Weekday::Sun => None,
        }
    }
}

/// [`AbCalendar::ab_day`] with ISO numbering.
pub fn ab_day(date: NaiveDate) -> AbDay {
    AbCalendar::default().ab_day(date)
}

/// [`AbCalendar::label_for_header`] with ISO numbering.
pub fn ab_label_for_header(date: NaiveDate) -> Option<AbDay> {
    AbCalendar::default().label_for_header(date)
}
