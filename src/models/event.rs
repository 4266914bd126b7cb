//! Materialized calendar event.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AbDay, RecurringDay, TeacherId};

/// A concrete, dated occurrence of a class.
///
/// Instances have no lifecycle of their own: they are recomputed from a
/// [`ClassDefinition`](super::ClassDefinition) and a week anchor whenever
/// either changes. Times are local wall-clock, no timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInstance {
    /// Instance identifier (`"{definition id}-{date}"` when derived).
    pub id: String,
    /// Owning class definition, if known.
    pub class_definition_id: Option<Uuid>,
    /// Start (inclusive).
    pub start: NaiveDateTime,
    /// End (exclusive).
    pub end: NaiveDateTime,
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub room: String,
    pub subject: String,
    pub grade: String,
    /// Recurring days of the owning definition.
    pub recurring_days: BTreeSet<RecurringDay>,
    /// A/B label of this occurrence.
    pub ab_day: Option<AbDay>,
    /// Set when the instance double-books a teacher or room.
    pub has_conflict: bool,
}

impl EventInstance {
    /// Length of the occurrence.
    #[inline]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Calendar date of the start.
    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    /// School day of the start, `None` on weekends.
    pub fn recurring_day(&self) -> Option<RecurringDay> {
        RecurringDay::from_weekday(self.start.weekday())
    }

    /// Whether the two time ranges overlap (half-open, touching is not overlap).
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}
