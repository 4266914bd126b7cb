//! Weekday encodings and the normalizer between them.
//!
//! Two integer scales meet in this crate:
//!
//! | Scale | Range | Used by |
//! |-------|-------|---------|
//! | Canonical day-of-week | 0=Sunday..6=Saturday | availability windows, external records |
//! | Recurring day index | 0=Monday..4=Friday | class recurrence, stored schedule rows |
//!
//! Internally everything is [`chrono::Weekday`]; the integer scales only
//! exist at the boundaries and are converted with the functions below.

use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// A raw day-of-week value as it arrives from outside (name or number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayValue {
    /// Integer encoding (0-6, or legacy 1-7).
    Number(i64),
    /// Weekday name or numeric string.
    Text(String),
}

impl From<i64> for DayValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for DayValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Normalizes a day-of-week value to the canonical 0=Sunday..6=Saturday scale.
///
/// Accepts case-insensitive weekday names (full or three-letter), numeric
/// strings and integers. 0-6 are returned unchanged; the legacy value 7 is
/// Sunday. Anything else yields `None`, which callers must exclude from
/// matching rather than read as Sunday.
pub fn normalize_day_of_week(value: &DayValue) -> Option<u8> {
    match value {
        DayValue::Number(n) => normalize_number(*n),
        DayValue::Text(text) => {
            let text = text.trim();
            if let Ok(n) = text.parse::<i64>() {
                return normalize_number(n);
            }
            weekday_from_name(text).map(|d| d.num_days_from_sunday() as u8)
        }
    }
}

fn normalize_number(n: i64) -> Option<u8> {
    match n {
        0..=6 => Some(n as u8),
        7 => Some(0),
        _ => None,
    }
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    let day = match name.to_ascii_lowercase().as_str() {
        "sunday" | "sun" => Weekday::Sun,
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        _ => return None,
    };
    Some(day)
}

/// Converts a canonical 0=Sunday number to a weekday.
pub fn weekday_from_number(n: u8) -> Option<Weekday> {
    match n {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// A school-week day used for class recurrence (0=Monday..4=Friday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RecurringDay(u8);

impl RecurringDay {
    pub const MONDAY: Self = Self(0);
    pub const TUESDAY: Self = Self(1);
    pub const WEDNESDAY: Self = Self(2);
    pub const THURSDAY: Self = Self(3);
    pub const FRIDAY: Self = Self(4);

    /// All five school days, Monday first.
    pub const ALL: [Self; 5] = [
        Self::MONDAY,
        Self::TUESDAY,
        Self::WEDNESDAY,
        Self::THURSDAY,
        Self::FRIDAY,
    ];

    /// Creates a recurring day from its index. `None` outside 0..=4.
    pub fn new(index: u8) -> Option<Self> {
        (index <= 4).then_some(Self(index))
    }

    /// The 0-4 index.
    #[inline]
    pub fn index(self) -> u8 {
        self.0
    }

    /// Maps a calendar weekday to a school day. Weekends yield `None`.
    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Sat | Weekday::Sun => None,
            other => Some(Self(other.num_days_from_monday() as u8)),
        }
    }

    /// The calendar weekday of this school day.
    pub fn weekday(self) -> Weekday {
        // index 0..=4 always lands on Mon..Fri
        weekday_from_number(recurring_day_to_weekday_number(self)).unwrap_or(Weekday::Mon)
    }

    /// Full English day name.
    pub fn name(self) -> &'static str {
        match self.0 {
            0 => "Monday",
            1 => "Tuesday",
            2 => "Wednesday",
            3 => "Thursday",
            _ => "Friday",
        }
    }
}

/// Converts a recurring day index to the canonical 0=Sunday scale (`idx + 1`).
#[inline]
pub fn recurring_day_to_weekday_number(day: RecurringDay) -> u8 {
    day.0 + 1
}

impl TryFrom<u8> for RecurringDay {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("recurring day out of range: {}", value))
    }
}

impl From<RecurringDay> for u8 {
    fn from(day: RecurringDay) -> Self {
        day.0
    }
}

impl fmt::Display for RecurringDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
