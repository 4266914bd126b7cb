//! Recurring class materialization.
//!
//! # Algorithm
//!
//! 1. Find the Monday of the week containing the anchor date.
//! 2. For each recurring day (0=Monday..4=Friday), offset from that Monday.
//! 3. Combine the date with the definition's start and end times.
//!
//! A definition without recurring days falls back to the weekday of its
//! start date, when that date is a school day.
//!
//! Definitions are expected to have passed [`validate_class`](crate::validation::validate_class),
//! so every produced instance has `start < end` and the definition's duration.

use chrono::{Datelike, NaiveDate, TimeDelta};

use super::AbCalendar;
use crate::models::{ClassDefinition, EventInstance, RecurringDay};

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - TimeDelta::days(date.weekday().num_days_from_monday() as i64)
}

/// Date of a school day within the week containing `anchor`.
pub fn date_in_week(anchor: NaiveDate, day: RecurringDay) -> NaiveDate {
    week_start(anchor) + TimeDelta::days(day.index() as i64)
}

/// Materializes class definitions into dated events.
#[derive(Debug, Clone, Copy, Default)]
pub struct Expander {
    calendar: AbCalendar,
}

impl Expander {
    /// Creates an expander labelling instances with `calendar`.
    pub fn new(calendar: AbCalendar) -> Self {
        Self { calendar }
    }

    /// The A/B calendar used for instance labels.
    pub fn calendar(&self) -> &AbCalendar {
        &self.calendar
    }

    /// Expands one definition into the week containing `week_anchor`.
    ///
    /// Produces one instance per recurring day, or at most one from the
    /// start-date fallback when no days are set.
    pub fn expand(&self, definition: &ClassDefinition, week_anchor: NaiveDate) -> Vec<EventInstance> {
        definition.occurrence_days()
            .into_iter()
            .map(|day| self.instance(definition, date_in_week(week_anchor, day)))
            .collect()
    }

    /// Expands one definition over every date in `[from, to]`.
    ///
    /// Occurrences whose A/B constraint disagrees with the date's header
    /// label are skipped; this is where alternating Fridays drop out.
    pub fn expand_range(
        &self,
        definition: &ClassDefinition,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<EventInstance> {
        let days = definition.occurrence_days();
        if days.is_empty() {
            return Vec::new();
        }

        from.iter_days()
            .take_while(|date| *date <= to)
            .filter(|date| {
                RecurringDay::from_weekday(date.weekday()).is_some_and(|d| days.contains(&d))
            })
            .filter(|date| match (definition.ab_constraint, self.calendar.label_for_header(*date)) {
                (Some(required), Some(label)) => required == label,
                _ => true,
            })
            .map(|date| self.instance(definition, date))
            .collect()
    }

    /// Expands every definition into one week, ordered by start then subject.
    pub fn derive_schedule(
        &self,
        definitions: &[ClassDefinition],
        week_anchor: NaiveDate,
    ) -> Vec<EventInstance> {
        let mut instances: Vec<EventInstance> = definitions
            .iter()
            .flat_map(|d| self.expand(d, week_anchor))
            .collect();
        instances.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.subject.cmp(&b.subject)));
        instances
    }

    fn instance(&self, definition: &ClassDefinition, date: NaiveDate) -> EventInstance {
        EventInstance {
            id: format!("{}-{}", definition.id, date),
            class_definition_id: Some(definition.id),
            start: date.and_time(definition.start_time),
            end: date.and_time(definition.end_time),
            teacher_id: definition.teacher_id,
            teacher_name: definition.teacher_name.clone(),
            room: definition.room.clone(),
            subject: definition.subject.clone(),
            grade: definition.grade.clone(),
            recurring_days: definition.recurring_days.clone(),
            ab_day: definition
                .ab_constraint
                .or_else(|| self.calendar.label_for_header(date)),
            has_conflict: false,
        }
    }
}

/// [`Expander::expand`] with ISO week numbering.
pub fn expand(definition: &ClassDefinition, week_anchor: NaiveDate) -> Vec<EventInstance> {
    Expander::default().expand(definition, week_anchor)
}

/// [`Expander::derive_schedule`] with ISO week numbering.
pub fn derive_schedule(definitions: &[ClassDefinition], week_anchor: NaiveDate) -> Vec<EventInstance> {
    Expander::default().derive_schedule(definitions, week_anchor)
}
