//! Teacher availability windows.
//!
//! A window declares that a teacher may be scheduled on one day of the week
//! between two times of day. Windows are fetched from the backend and never
//! mutated here; redundant windows are collapsed with
//! [`merge_overlapping_windows`].
//!
//! # Time Model
//! Windows are half-open `[start, end)` on the canonical 0=Sunday scale.
//! An occurrence is available iff a single window of the same teacher and
//! day fully contains it. Partial overlap is not availability.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{EventInstance, TeacherId};

/// A weekly availability window for one teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// Teacher the window belongs to.
    pub teacher_id: TeacherId,
    /// Day of week, 0=Sunday..6=Saturday.
    pub day_of_week: u8,
    /// Window start (inclusive).
    pub start_time: NaiveTime,
    /// Window end (exclusive).
    pub end_time: NaiveTime,
}

impl AvailabilityWindow {
    /// Creates a new window.
    pub fn new(
        teacher_id: TeacherId,
        day_of_week: u8,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            teacher_id,
            day_of_week,
            start_time,
            end_time,
        }
    }

    /// Whether `[start, end)` lies entirely inside this window.
    #[inline]
    pub fn contains_range(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.start_time <= start && end <= self.end_time
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }

    fn key(&self) -> (TeacherId, u8) {
        (self.teacher_id, self.day_of_week)
    }
}

/// Collapses overlapping or touching windows per (teacher, day).
///
/// Each group is sorted by start and swept once: a window starting at or
/// before the running window's end extends it. Output is ordered by
/// teacher, day, then start. Applying the merge twice changes nothing.
pub fn merge_overlapping_windows(windows: &[AvailabilityWindow]) -> Vec<AvailabilityWindow> {
    let mut groups: BTreeMap<(TeacherId, u8), Vec<&AvailabilityWindow>> = BTreeMap::new();
    for w in windows {
        groups.entry(w.key()).or_default().push(w);
    }

    let mut merged = Vec::with_capacity(windows.len());
    for (_, mut group) in groups {
        group.sort_by_key(|w| (w.start_time, w.end_time));

        let mut iter = group.into_iter();
        let Some(first) = iter.next() else {
            continue;
        };
        let mut current = first.clone();
        for next in iter {
            if next.start_time <= current.end_time {
                current.end_time = current.end_time.max(next.end_time);
            } else {
                merged.push(std::mem::replace(&mut current, next.clone()));
            }
        }
        merged.push(current);
    }

    merged
}

/// Whether some window of the event's teacher and day fully contains it.
///
/// Occurrences crossing midnight are never available.
pub fn is_within_availability(event: &EventInstance, windows: &[AvailabilityWindow]) -> bool {
    if event.end.date() != event.start.date() {
        return false;
    }
    let day = event.start.weekday().num_days_from_sunday() as u8;
    let (start, end) = (event.start.time(), event.end.time());

    windows.iter().any(|w| {
        w.teacher_id == event.teacher_id && w.day_of_week == day && w.contains_range(start, end)
    })
}

/// Merged availability keyed by (teacher, day).
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    windows: BTreeMap<(TeacherId, u8), Vec<AvailabilityWindow>>,
}

impl AvailabilityIndex {
    /// Builds the index, merging windows first.
    pub fn new(windows: &[AvailabilityWindow]) -> Self {
        let mut index: BTreeMap<(TeacherId, u8), Vec<AvailabilityWindow>> = BTreeMap::new();
        for w in merge_overlapping_windows(windows) {
            index.entry(w.key()).or_default().push(w);
        }
        Self { windows: index }
    }

    /// Merged windows for a teacher on a day (0=Sunday).
    pub fn windows_for(&self, teacher_id: TeacherId, day_of_week: u8) -> &[AvailabilityWindow] {
        self.windows
            .get(&(teacher_id, day_of_week))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `[start, end)` is fully inside one window.
    pub fn contains(
        &self,
        teacher_id: TeacherId,
        day_of_week: u8,
        start: NaiveTime,
        end: NaiveTime,
    ) -> bool {
        self.windows_for(teacher_id, day_of_week)
            .iter()
            .any(|w| w.contains_range(start, end))
    }

    /// All merged windows, ordered by teacher, day, start.
    pub fn iter(&self) -> impl Iterator<Item = &AvailabilityWindow> {
        self.windows.values().flatten()
    }

    /// Number of merged windows.
    pub fn len(&self) -> usize {
        self.windows.values().map(Vec::len).sum()
    }

    /// Whether no windows are indexed.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
