//! Conflict detection for recurring classes.
//!
//! Checks a candidate class against teacher availability and against every
//! known event for teacher and room double-booking.
//!
//! # Algorithm
//!
//! 1. Expand the candidate into a fixed reference week, so that recurring
//!    classes share one timeline whatever week they were created in.
//! 2. Each candidate occurrence must sit fully inside one merged
//!    availability window of its teacher on that day.
//! 3. Existing events are projected onto the same reference week by
//!    weekday. A pair conflicts when it falls on the same weekday, the
//!    ranges overlap (`s1 < e2 && s2 < e1`), and the teacher or the room
//!    is shared. A pair sharing both yields both messages.
//! 4. Events of the definition being edited are excluded first.
//!
//! Each weekday is an independent timeline: overlap across days is never
//! reported. Conflicts are advisory; saving over them needs an explicit
//! confirmation outside this module.

use std::collections::HashMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{date_in_week, Expander};
use crate::models::{
    AvailabilityIndex, AvailabilityWindow, ClassDefinition, EventInstance, RecurringDay, TeacherId,
};

/// Monday 2024-01-01, the default reference week for comparisons.
pub const DEFAULT_REFERENCE_WEEK: NaiveDate = match NaiveDate::from_ymd_opt(2024, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// Classification of a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictKind {
    /// No availability window contains the occurrence.
    TeacherUnavailable,
    /// The teacher already teaches at that time.
    TeacherDoubleBooked,
    /// The room is already in use at that time.
    RoomDoubleBooked,
}

/// An advisory conflict for one occurrence of a candidate class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictMessage {
    /// Type of conflict.
    pub kind: ConflictKind,
    /// School day of the candidate occurrence.
    pub day: RecurringDay,
    /// Candidate occurrence start.
    pub start: NaiveTime,
    /// Candidate occurrence end.
    pub end: NaiveTime,
    /// Subject of the clashing event (double-booking only).
    pub conflicting_subject: Option<String>,
    /// Id of the clashing event (double-booking only).
    pub conflicting_event_id: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl ConflictMessage {
    /// Creates a teacher-unavailable conflict.
    pub fn teacher_unavailable(teacher: &str, day: RecurringDay, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            kind: ConflictKind::TeacherUnavailable,
            day,
            start,
            end,
            conflicting_subject: None,
            conflicting_event_id: None,
            message: format!(
                "{} is not available on {} {}",
                teacher,
                day,
                time_range(start, end)
            ),
        }
    }

    /// Creates a teacher double-booking conflict.
    pub fn teacher_double_booked(
        teacher: &str,
        day: RecurringDay,
        start: NaiveTime,
        end: NaiveTime,
        existing: &EventInstance,
    ) -> Self {
        Self {
            kind: ConflictKind::TeacherDoubleBooked,
            day,
            start,
            end,
            conflicting_subject: Some(existing.subject.clone()),
            conflicting_event_id: Some(existing.id.clone()),
            message: format!(
                "{} is already teaching {} on {} {}",
                teacher,
                existing.subject,
                day,
                time_range(existing.start.time(), existing.end.time())
            ),
        }
    }

    /// Creates a room double-booking conflict.
    pub fn room_double_booked(
        room: &str,
        day: RecurringDay,
        start: NaiveTime,
        end: NaiveTime,
        existing: &EventInstance,
    ) -> Self {
        Self {
            kind: ConflictKind::RoomDoubleBooked,
            day,
            start,
            end,
            conflicting_subject: Some(existing.subject.clone()),
            conflicting_event_id: Some(existing.id.clone()),
            message: format!(
                "Room {} is already booked for {} on {} {}",
                room,
                existing.subject,
                day,
                time_range(existing.start.time(), existing.end.time())
            ),
        }
    }
}

impl fmt::Display for ConflictMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn time_range(start: NaiveTime, end: NaiveTime) -> String {
    format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
}

fn teacher_label(name: &str, id: TeacherId) -> String {
    if name.trim().is_empty() {
        format!("Teacher {}", id)
    } else {
        name.to_string()
    }
}

/// Conflict detector bound to a reference week.
#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector {
    reference_week: NaiveDate,
    expander: Expander,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_WEEK, Expander::default())
    }
}

impl ConflictDetector {
    /// Creates a detector comparing on the week containing `reference_week`.
    pub fn new(reference_week: NaiveDate, expander: Expander) -> Self {
        Self {
            reference_week,
            expander,
        }
    }

    /// Reports every conflict of `candidate` against known events and availability.
    ///
    /// An empty result means the candidate can be saved without confirmation.
    pub fn detect(
        &self,
        candidate: &ClassDefinition,
        existing: &[EventInstance],
        availability: &[AvailabilityWindow],
    ) -> Vec<ConflictMessage> {
        let index = AvailabilityIndex::new(availability);
        let teacher = teacher_label(&candidate.teacher_name, candidate.teacher_id);

        let others: Vec<EventInstance> = existing
            .iter()
            .filter(|e| e.class_definition_id != Some(candidate.id))
            .filter_map(|e| self.project(e))
            .collect();

        let mut messages = Vec::new();
        for occurrence in self.expander.expand(candidate, self.reference_week) {
            let Some(day) = occurrence.recurring_day() else {
                continue;
            };
            let (start, end) = (occurrence.start.time(), occurrence.end.time());

            let weekday = occurrence.start.weekday().num_days_from_sunday() as u8;
            if !index.contains(candidate.teacher_id, weekday, start, end) {
                messages.push(ConflictMessage::teacher_unavailable(&teacher, day, start, end));
            }

            for other in others.iter().filter(|o| o.date() == occurrence.date()) {
                if !occurrence.overlaps(other) {
                    continue;
                }
                if other.teacher_id == candidate.teacher_id {
                    messages.push(ConflictMessage::teacher_double_booked(
                        &teacher, day, start, end, other,
                    ));
                }
                if other.room == candidate.room {
                    messages.push(ConflictMessage::room_double_booked(
                        &candidate.room,
                        day,
                        start,
                        end,
                        other,
                    ));
                }
            }
        }

        debug!(
            class_id = %candidate.id,
            subject = %candidate.subject,
            compared = others.len(),
            conflicts = messages.len(),
            "Checked class for conflicts"
        );
        messages
    }

    /// Moves a weekday event onto the reference week, keeping its times.
    fn project(&self, event: &EventInstance) -> Option<EventInstance> {
        let day = event.recurring_day()?;
        let date = date_in_week(self.reference_week, day);
        let start = date.and_time(event.start.time());
        Some(EventInstance {
            start,
            end: start + event.duration(),
            ..event.clone()
        })
    }
}

/// [`ConflictDetector::detect`] on the default reference week.
pub fn detect_conflicts(
    candidate: &ClassDefinition,
    existing: &[EventInstance],
    availability: &[AvailabilityWindow],
) -> Vec<ConflictMessage> {
    ConflictDetector::default().detect(candidate, existing, availability)
}

/// Flags every event that double-books a teacher or room on its date.
///
/// Clears stale flags first. Returns the number of flagged events.
pub fn mark_conflicts(events: &mut [EventInstance]) -> usize {
    let mut by_date: HashMap<NaiveDate, Vec<usize>> = HashMap::new();
    for (i, e) in events.iter_mut().enumerate() {
        e.has_conflict = false;
        by_date.entry(e.date()).or_default().push(i);
    }

    let mut flagged = vec![false; events.len()];
    for indices in by_date.values() {
        for (n, &i) in indices.iter().enumerate() {
            for &j in &indices[n + 1..] {
                let (a, b) = (&events[i], &events[j]);
                let shared = a.teacher_id == b.teacher_id || a.room == b.room;
                if shared && a.overlaps(b) {
                    flagged[i] = true;
                    flagged[j] = true;
                }
            }
        }
    }

    for (e, flag) in events.iter_mut().zip(&flagged) {
        e.has_conflict = *flag;
    }
    flagged.iter().filter(|f| **f).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::expand;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn math() -> ClassDefinition {
        ClassDefinition::new("Math", 7, "204", hm(9, 0), hm(9, 50))
            .with_days([RecurringDay::MONDAY, RecurringDay::WEDNESDAY])
    }

    fn open_all_week(teacher: TeacherId) -> Vec<AvailabilityWindow> {
        (1..=5)
            .map(|day| AvailabilityWindow::new(teacher, day, hm(7, 0), hm(17, 0)))
            .collect()
    }

    #[test]
    fn test_scenario_available_no_conflicts() {
        let availability = vec![
            AvailabilityWindow::new(7, 1, hm(8, 0), hm(12, 0)),
            AvailabilityWindow::new(7, 3, hm(8, 0), hm(12, 0)),
        ];
        assert!(detect_conflicts(&math(), &[], &availability).is_empty());
    }

    #[test]
    fn test_scenario_partial_availability() {
        let availability = vec![AvailabilityWindow::new(7, 1, hm(8, 0), hm(9, 30))];
        let messages = detect_conflicts(&math(), &[], &availability);

        assert_eq!(messages.len(), 2);
        assert!(messages
            .iter()
            .all(|m| m.kind == ConflictKind::TeacherUnavailable));
        assert_eq!(messages[0].day, RecurringDay::MONDAY);
        assert_eq!(messages[1].day, RecurringDay::WEDNESDAY);
        assert!(messages[1].message.contains("Wednesday"));
        assert!(messages[1].message.contains("09:00-09:50"));
    }

    #[test]
    fn test_scenario_room_double_booking() {
        let first = ClassDefinition::new("Math", 7, "204", hm(9, 0), hm(9, 50))
            .with_days([RecurringDay::MONDAY]);
        let mut second = ClassDefinition::new("Science", 8, "204", hm(9, 30), hm(10, 20))
            .with_days([RecurringDay::MONDAY]);
        let mut availability = open_all_week(7);
        availability.extend(open_all_week(8));

        let existing = expand(&first, d(2024, 9, 2));
        let messages = detect_conflicts(&second, &existing, &availability);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, ConflictKind::RoomDoubleBooked);
        assert_eq!(messages[0].conflicting_subject.as_deref(), Some("Math"));

        second.room = "205".into();
        assert!(detect_conflicts(&second, &existing, &availability).is_empty());
    }

    #[test]
    fn test_same_teacher_disjoint_days() {
        let other = ClassDefinition::new("Reading", 7, "110", hm(9, 0), hm(9, 50))
            .with_days([RecurringDay::TUESDAY, RecurringDay::THURSDAY]);
        let existing = expand(&other, d(2024, 9, 2));
        assert!(detect_conflicts(&math(), &existing, &open_all_week(7)).is_empty());
    }

    #[test]
    fn test_same_teacher_same_day_overlap() {
        let other = ClassDefinition::new("Reading", 7, "110", hm(9, 30), hm(10, 0))
            .with_days([RecurringDay::WEDNESDAY]);
        let existing = expand(&other, d(2025, 2, 10));
        let messages = detect_conflicts(&math(), &existing, &open_all_week(7));

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, ConflictKind::TeacherDoubleBooked);
        assert_eq!(messages[0].day, RecurringDay::WEDNESDAY);
        assert!(messages[0].message.contains("Reading"));
    }

    #[test]
    fn test_shared_teacher_and_room_reports_both() {
        let other = ClassDefinition::new("Reading", 7, "204", hm(9, 30), hm(10, 0))
            .with_days([RecurringDay::MONDAY]);
        let existing = expand(&other, d(2024, 9, 2));
        let messages = detect_conflicts(&math(), &existing, &open_all_week(7));
        let kinds: Vec<_> = messages.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![ConflictKind::TeacherDoubleBooked, ConflictKind::RoomDoubleBooked]
        );
    }

    #[test]
    fn test_touching_ranges_do_not_conflict() {
        let other = ClassDefinition::new("Reading", 7, "204", hm(9, 50), hm(10, 40))
            .with_days([RecurringDay::MONDAY]);
        let existing = expand(&other, d(2024, 9, 2));
        assert!(detect_conflicts(&math(), &existing, &open_all_week(7)).is_empty());
    }

    #[test]
    fn test_edit_excludes_itself() {
        let class = math();
        let existing = expand(&class, d(2024, 9, 2));
        assert!(detect_conflicts(&class, &existing, &open_all_week(7)).is_empty());

        let moved = class.clone().with_id(uuid::Uuid::new_v4());
        assert_eq!(detect_conflicts(&moved, &existing, &open_all_week(7)).len(), 4);
    }

    #[test]
    fn test_weekend_events_ignored() {
        let mut saturday = expand(&math(), d(2024, 9, 2)).remove(0);
        saturday.class_definition_id = None;
        saturday.start = d(2024, 9, 7).and_time(hm(9, 0));
        saturday.end = d(2024, 9, 7).and_time(hm(9, 50));
        assert!(detect_conflicts(&math(), &[saturday], &open_all_week(7)).is_empty());
    }

    #[test]
    fn test_unavailable_uses_teacher_name() {
        let class = math().with_teacher_name("Ms. Rivera");
        let messages = detect_conflicts(&class, &[], &[]);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].message.starts_with("Ms. Rivera is not available on Monday"));
    }

    #[test]
    fn test_mark_conflicts() {
        let math = math();
        let science = ClassDefinition::new("Science", 8, "204", hm(9, 30), hm(10, 20))
            .with_days([RecurringDay::WEDNESDAY]);
        let art = ClassDefinition::new("Art", 9, "300", hm(9, 0), hm(10, 0))
            .with_days([RecurringDay::WEDNESDAY]);

        let anchor = d(2024, 9, 2);
        let mut events: Vec<_> = [&math, &science, &art]
            .into_iter()
            .flat_map(|c| expand(c, anchor))
            .collect();
        events[0].has_conflict = true; // stale flag on Monday Math

        assert_eq!(mark_conflicts(&mut events), 2);
        assert!(!events[0].has_conflict);
        assert!(events[1].has_conflict); // Wednesday Math
        assert!(events[2].has_conflict); // Science
        assert!(!events[3].has_conflict); // Art
    }
}
