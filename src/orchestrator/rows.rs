//! Stored row shape and regrouping.
//!
//! One logical class is persisted as one row per recurring weekday. Rows
//! carry a `class_group_id` linking them back to their definition; rows
//! written before that field existed are grouped by field equality and
//! given a deterministic UUID v5.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::calendar::{date_in_week, AbCalendar};
use crate::models::{
    normalize_day_of_week, AbDay, AvailabilityWindow, ClassDefinition, DayValue, EventInstance,
    RecurringDay, TeacherId,
};

/// Backend row identifier.
pub type RowId = i64;

/// Local wall-clock format used on the wire (no timezone).
pub const WALL_CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

mod wall_clock {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::WALL_CLOCK_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(WALL_CLOCK_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, WALL_CLOCK_FORMAT).map_err(serde::de::Error::custom)
    }
}

mod ab_label {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::models::AbDay;

    pub fn serialize<S: Serializer>(value: &Option<AbDay>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.map(AbDay::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<AbDay>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        AbDay::parse_label(raw.as_deref().unwrap_or("")).map_err(serde::de::Error::custom)
    }
}

/// One weekday row as sent to and received from the schedule API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    #[serde(with = "wall_clock")]
    pub start_time: NaiveDateTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveDateTime,
    /// Teacher id.
    pub user_id: TeacherId,
    pub room: String,
    #[serde(default)]
    pub grade: String,
    pub subject: String,
    pub recurring_day: RecurringDay,
    #[serde(with = "ab_label", default)]
    pub ab_day: Option<AbDay>,
    #[serde(default)]
    pub description: String,
    /// Links the row to its class definition. Absent on legacy rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_group_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub teacher_name: String,
}

impl ScheduleRow {
    /// Builds the row for `day`, dated within the week containing `week_anchor`.
    pub fn from_definition(
        definition: &ClassDefinition,
        day: RecurringDay,
        week_anchor: NaiveDate,
    ) -> Self {
        let date = date_in_week(week_anchor, day);
        Self {
            start_time: date.and_time(definition.start_time),
            end_time: date.and_time(definition.end_time),
            user_id: definition.teacher_id,
            room: definition.room.clone(),
            grade: definition.grade.clone(),
            subject: definition.subject.clone(),
            recurring_day: day,
            ab_day: definition.ab_constraint,
            description: definition.description.clone(),
            class_group_id: Some(definition.id),
            teacher_name: definition.teacher_name.clone(),
        }
    }

    /// Places this row on `date`, keeping its own times.
    ///
    /// Rows of one class can disagree on times after a partially applied
    /// update, so instances are built per row rather than per definition.
    pub fn to_instance(
        &self,
        definition: &ClassDefinition,
        date: NaiveDate,
        calendar: &AbCalendar,
    ) -> EventInstance {
        let start = date.and_time(self.start_time.time());
        EventInstance {
            id: format!("{}-{}", definition.id, date),
            class_definition_id: Some(definition.id),
            start,
            end: start + (self.end_time - self.start_time),
            teacher_id: self.user_id,
            teacher_name: self.teacher_name.clone(),
            room: self.room.clone(),
            subject: self.subject.clone(),
            grade: self.grade.clone(),
            recurring_days: definition.recurring_days.clone(),
            ab_day: self.ab_day.or_else(|| calendar.label_for_header(date)),
            has_conflict: false,
        }
    }

    /// Group id, derived from the row's fields when none was stored.
    pub fn group_id(&self) -> Uuid {
        self.class_group_id.unwrap_or_else(|| {
            let key = format!(
                "{}|{}|{}|{}|{}|{}|{}",
                self.subject,
                self.user_id,
                self.grade,
                self.room,
                self.start_time.time().format("%H:%M:%S"),
                self.end_time.time().format("%H:%M:%S"),
                self.ab_day.map(AbDay::as_str).unwrap_or(""),
            );
            Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
        })
    }
}

/// A row with its backend id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    pub id: RowId,
    #[serde(flatten)]
    pub row: ScheduleRow,
}

/// Teacher availability as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub teacher_id: TeacherId,
    pub day_of_week: DayValue,
    pub start_time: String,
    pub end_time: String,
}

impl AvailabilityRecord {
    /// Normalized window, or `None` if the day or a time is unrecognized.
    pub fn to_window(&self) -> Option<AvailabilityWindow> {
        let day = normalize_day_of_week(&self.day_of_week)?;
        let start = parse_time_of_day(&self.start_time)?;
        let end = parse_time_of_day(&self.end_time)?;
        Some(AvailabilityWindow::new(self.teacher_id, day, start, end))
    }
}

fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Converts availability records, skipping ones that cannot be normalized.
pub fn availability_windows(records: &[AvailabilityRecord]) -> Vec<AvailabilityWindow> {
    records
        .iter()
        .filter_map(|record| {
            let window = record.to_window();
            if window.is_none() {
                warn!(
                    teacher_id = record.teacher_id,
                    day_of_week = ?record.day_of_week,
                    start = %record.start_time,
                    end = %record.end_time,
                    "Skipping unrecognized availability record"
                );
            }
            window
        })
        .collect()
}

/// Stored rows of one logical class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroup {
    pub definition: ClassDefinition,
    /// Row id per weekday, ordered by day.
    pub rows: Vec<(RecurringDay, RowId)>,
}

impl RowGroup {
    /// Row id stored for `day`.
    pub fn row_for(&self, day: RecurringDay) -> Option<RowId> {
        self.rows.iter().find(|(d, _)| *d == day).map(|(_, id)| *id)
    }
}

/// Regroups stored weekday rows into class definitions.
///
/// Display fields are taken from the lowest row id of each group. The
/// definition's `start_date` is the earliest row date.
pub fn group_rows<'a>(rows: impl IntoIterator<Item = (RowId, &'a ScheduleRow)>) -> Vec<RowGroup> {
    let mut sorted: Vec<(RowId, &ScheduleRow)> = rows.into_iter().collect();
    sorted.sort_by_key(|(id, _)| *id);

    let mut groups: BTreeMap<Uuid, RowGroup> = BTreeMap::new();
    for (id, row) in sorted {
        let date = row.start_time.date();
        let group = groups.entry(row.group_id()).or_insert_with_key(|key| RowGroup {
            definition: ClassDefinition {
                id: *key,
                subject: row.subject.clone(),
                teacher_id: row.user_id,
                teacher_name: row.teacher_name.clone(),
                room: row.room.clone(),
                grade: row.grade.clone(),
                description: row.description.clone(),
                start_time: row.start_time.time(),
                end_time: row.end_time.time(),
                recurring_days: Default::default(),
                ab_constraint: row.ab_day,
                start_date: Some(date),
            },
            rows: Vec::new(),
        });

        let definition = &mut group.definition;
        definition.recurring_days.insert(row.recurring_day);
        if definition.start_date.map_or(true, |d| date < d) {
            definition.start_date = Some(date);
        }
        group.rows.push((row.recurring_day, id));
    }

    groups
        .into_values()
        .map(|mut group| {
            group.rows.sort();
            group
        })
        .collect()
}
