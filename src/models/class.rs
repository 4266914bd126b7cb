//! Class definition model.
//!
//! A class definition is one logical recurring class: a subject taught by a
//! teacher in a room at a fixed time of day on a set of school days. It is
//! persisted as one row per recurring day, all rows sharing the definition
//! `id` as their class group identifier.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RecurringDay;

/// Teacher (user) identifier as issued by the backend.
pub type TeacherId = i64;

/// Alternating-week label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbDay {
    A,
    B,
}

impl AbDay {
    /// Single-letter label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }

    /// Parses the wire label, where an empty string means "no constraint".
    pub fn parse_label(label: &str) -> Result<Option<Self>, String> {
        let label = label.trim();
        if label.is_empty() {
            return Ok(None);
        }
        label.parse().map(Some)
    }
}

impl FromStr for AbDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            other => Err(format!("invalid A/B day label: '{}'", other)),
        }
    }
}

impl fmt::Display for AbDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical recurring class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDefinition {
    /// Class group identifier, shared by every stored weekday row.
    pub id: Uuid,
    /// Subject taught.
    pub subject: String,
    /// Assigned teacher.
    pub teacher_id: TeacherId,
    /// Teacher display name (may be empty).
    pub teacher_name: String,
    /// Room label.
    pub room: String,
    /// Grade label.
    pub grade: String,
    /// Free-form description stored with each row.
    pub description: String,
    /// Daily start time.
    pub start_time: NaiveTime,
    /// Daily end time.
    pub end_time: NaiveTime,
    /// School days the class recurs on.
    pub recurring_days: BTreeSet<RecurringDay>,
    /// Restricts the class to A or B days.
    pub ab_constraint: Option<AbDay>,
    /// Date the class was first placed. Only used when `recurring_days` is empty.
    pub start_date: Option<NaiveDate>,
}

impl ClassDefinition {
    /// Creates a definition with a fresh group id and no recurring days.
    pub fn new(
        subject: impl Into<String>,
        teacher_id: TeacherId,
        room: impl Into<String>,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject: subject.into(),
            teacher_id,
            teacher_name: String::new(),
            room: room.into(),
            grade: String::new(),
            description: String::new(),
            start_time,
            end_time,
            recurring_days: BTreeSet::new(),
            ab_constraint: None,
            start_date: None,
        }
    }

    /// Sets the group id (used when editing an existing class).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Replaces the recurring days.
    pub fn with_days(mut self, days: impl IntoIterator<Item = RecurringDay>) -> Self {
        self.recurring_days = days.into_iter().collect();
        self
    }

    /// Sets the grade.
    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = grade.into();
        self
    }

    /// Sets the teacher display name.
    pub fn with_teacher_name(mut self, name: impl Into<String>) -> Self {
        self.teacher_name = name.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restricts the class to A or B days.
    pub fn with_ab_constraint(mut self, ab: AbDay) -> Self {
        self.ab_constraint = Some(ab);
        self
    }

    /// Sets the first placement date.
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Length of one occurrence.
    #[inline]
    pub fn duration(&self) -> TimeDelta {
        self.end_time - self.start_time
    }

    /// Days the class actually occurs on.
    ///
    /// The recurring days when set; otherwise the weekday of `start_date`
    /// if that is a school day; otherwise nothing.
    pub fn occurrence_days(&self) -> Vec<RecurringDay> {
        if !self.recurring_days.is_empty() {
            return self.recurring_days.iter().copied().collect();
        }
        self.start_date
            .and_then(|date| RecurringDay::from_weekday(date.weekday()))
            .into_iter()
            .collect()
    }
}
