//! Schedule mutation orchestration.
//!
//! Persists one logical recurring class as one row per weekday against a
//! [`ScheduleApi`], keeping the local view of stored rows in step with what
//! the backend actually accepted.
//!
//! # Algorithm
//!
//! - **save**: one create per occurrence day.
//! - **update**: diff the stored weekdays against the new definition. Days
//!   in both are replaced in place (skipped when unchanged), new days are
//!   created, dropped days are deleted, in that order, so the class is never
//!   absent from the backend.
//! - **delete**: one delete per stored row.
//!
//! Calls are issued one at a time and awaited; local state changes only
//! after a call succeeds. There is no rollback: when some calls fail, the
//! successful ones stay applied and the result is
//! [`ScheduleError::PartialFailure`].

pub mod api;
pub mod http;
pub mod memory;
pub mod rows;

pub use api::ScheduleApi;
pub use http::HttpScheduleApi;
pub use memory::{ApiCall, InMemoryScheduleApi};
pub use rows::{
    availability_windows, group_rows, AvailabilityRecord, RowGroup, RowId, ScheduleRow, StoredRow,
    WALL_CLOCK_FORMAT,
};

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calendar::date_in_week;
use crate::config::{CalendarConfig, Settings};
use crate::conflict::{mark_conflicts, ConflictMessage};
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{AvailabilityWindow, ClassDefinition, EventInstance, RecurringDay};
use crate::validation::{
    validate_availability, validate_class, validate_classes, validate_new_class,
};

/// Default per-call timeout.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a fully successful mutation.
#[derive(Debug, Clone, Default)]
pub struct MutationReport {
    pub definition_id: Uuid,
    pub created: Vec<(RecurringDay, RowId)>,
    pub updated: Vec<(RecurringDay, RowId)>,
    pub deleted: Vec<(RecurringDay, RowId)>,
    /// Instances of the stored definition in its anchor week. Empty after a delete.
    pub instances: Vec<EventInstance>,
}

impl MutationReport {
    fn new(definition_id: Uuid) -> Self {
        Self {
            definition_id,
            ..Default::default()
        }
    }

    /// Number of backend calls that succeeded.
    pub fn changes(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }
}

/// Coordinates class mutations against a schedule backend.
pub struct ScheduleOrchestrator<A: ScheduleApi> {
    api: A,
    calendar: CalendarConfig,
    timeout: Duration,
    rows: BTreeMap<RowId, ScheduleRow>,
    availability: Vec<AvailabilityWindow>,
}

impl<A: ScheduleApi> ScheduleOrchestrator<A> {
    /// Creates an orchestrator with empty state and default calendar settings.
    pub fn new(api: A) -> Self {
        Self {
            api,
            calendar: CalendarConfig::default(),
            timeout: DEFAULT_CALL_TIMEOUT,
            rows: BTreeMap::new(),
            availability: Vec::new(),
        }
    }

    /// Creates an orchestrator using loaded settings.
    pub fn from_settings(api: A, settings: &Settings) -> Self {
        Self::new(api)
            .with_calendar(settings.calendar.clone())
            .with_timeout(settings.api.request_timeout())
    }

    pub fn with_calendar(mut self, calendar: CalendarConfig) -> Self {
        self.calendar = calendar;
        self
    }

    /// Sets the timeout applied to each backend call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Stored rows by backend id.
    pub fn rows(&self) -> &BTreeMap<RowId, ScheduleRow> {
        &self.rows
    }

    /// Availability windows from the last load.
    pub fn availability(&self) -> &[AvailabilityWindow] {
        &self.availability
    }

    /// Stored rows regrouped into classes.
    pub fn groups(&self) -> Vec<RowGroup> {
        group_rows(self.rows.iter().map(|(id, row)| (*id, row)))
    }

    /// Logical class definitions currently stored.
    pub fn definitions(&self) -> Vec<ClassDefinition> {
        self.groups().into_iter().map(|g| g.definition).collect()
    }

    /// Every stored row placed in the week containing `anchor`, with conflict flags set.
    ///
    /// Ordered by start, then subject.
    pub fn instances_for_week(&self, anchor: NaiveDate) -> Vec<EventInstance> {
        let mut instances = self.stored_instances(anchor);
        mark_conflicts(&mut instances);
        instances
    }

    fn stored_instances(&self, anchor: NaiveDate) -> Vec<EventInstance> {
        let expander = self.calendar.expander();
        let mut instances = Vec::with_capacity(self.rows.len());
        for group in self.groups() {
            for &(day, id) in &group.rows {
                if let Some(row) = self.rows.get(&id) {
                    let date = date_in_week(anchor, day);
                    instances.push(row.to_instance(&group.definition, date, expander.calendar()));
                }
            }
        }
        instances.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.subject.cmp(&b.subject)));
        instances
    }

    /// Fetches stored rows and teacher availability.
    ///
    /// Read failures are logged and leave the respective collection empty.
    pub async fn load(&mut self) {
        let schedules = self.call("list_schedules", self.api.list_schedules()).await;
        self.rows = match schedules {
            Ok(stored) => stored.into_iter().map(|s| (s.id, s.row)).collect(),
            Err(e) => {
                warn!(error = %e, "Failed to load schedules, continuing with none");
                BTreeMap::new()
            }
        };

        let records = self
            .call("list_teacher_availabilities", self.api.list_teacher_availabilities())
            .await;
        self.availability = match records {
            Ok(records) => {
                let windows = availability_windows(&records);
                if let Err(errors) = validate_availability(&windows) {
                    for error in &errors {
                        warn!(%error, "Suspicious availability window");
                    }
                }
                windows
            }
            Err(e) => {
                warn!(error = %e, "Failed to load teacher availability, continuing with none");
                Vec::new()
            }
        };

        if let Err(errors) = validate_classes(&self.definitions()) {
            for error in &errors {
                warn!(%error, "Suspicious stored class");
            }
        }

        info!(
            rows = self.rows.len(),
            windows = self.availability.len(),
            "Loaded schedule state"
        );
    }

    /// Validates `definition` and reports its conflicts with the stored classes.
    ///
    /// ## Errors
    /// [`ScheduleError::Validation`] if the definition is malformed.
    pub fn check(&self, definition: &ClassDefinition) -> ScheduleResult<Vec<ConflictMessage>> {
        validate_class(definition).map_err(ScheduleError::Validation)?;

        let existing = self.stored_instances(self.calendar.reference_week);
        Ok(self
            .calendar
            .detector()
            .detect(definition, &existing, &self.availability))
    }

    /// Saves a new class unless it conflicts and the conflicts were not confirmed.
    ///
    /// ## Errors
    /// [`ScheduleError::Conflict`] when conflicts exist and `confirmed` is false,
    /// otherwise as [`save`](Self::save).
    pub async fn save_checked(
        &mut self,
        definition: ClassDefinition,
        confirmed: bool,
    ) -> ScheduleResult<MutationReport> {
        let conflicts = self.check(&definition)?;
        if !conflicts.is_empty() && !confirmed {
            warn!(
                class_id = %definition.id,
                conflicts = conflicts.len(),
                "Save held back for conflict confirmation"
            );
            return Err(ScheduleError::Conflict(conflicts));
        }
        self.save(definition).await
    }

    /// Stores a new class, one row per occurrence day.
    ///
    /// ## Errors
    /// - [`ScheduleError::Validation`] if the definition is malformed or its
    ///   id is already stored (use [`update`](Self::update) for those).
    /// - The first call error if no row was stored.
    /// - [`ScheduleError::PartialFailure`] if only some rows were stored.
    pub async fn save(&mut self, definition: ClassDefinition) -> ScheduleResult<MutationReport> {
        validate_new_class(&definition, &self.definitions()).map_err(ScheduleError::Validation)?;

        let anchor = self.anchor(&definition);
        let mut report = MutationReport::new(definition.id);
        let mut failures = Vec::new();

        for day in definition.occurrence_days() {
            let row = ScheduleRow::from_definition(&definition, day, anchor);
            let result = self.call("create_schedule", self.api.create_schedule(&row)).await;
            match result {
                Ok(id) => {
                    self.rows.insert(id, row);
                    report.created.push((day, id));
                }
                Err(e) => failures.push((day, e)),
            }
        }

        report.instances = self.calendar.expander().expand(&definition, anchor);
        self.finish("save", report, failures)
    }

    /// Replaces the stored class `old_id` with `definition`.
    ///
    /// The definition keeps `old_id` as its group id. Patched rows keep the
    /// date they were stored on; new days are placed in the week of the
    /// definition's start date, or of the stored class when it has none.
    ///
    /// ## Errors
    /// - [`ScheduleError::NotFound`] if no stored class has `old_id`.
    /// - [`ScheduleError::Validation`] if the definition is malformed.
    /// - The first call error if no change was applied.
    /// - [`ScheduleError::PartialFailure`] if only some changes were applied.
    pub async fn update(
        &mut self,
        old_id: Uuid,
        mut definition: ClassDefinition,
    ) -> ScheduleResult<MutationReport> {
        let group = self.group(old_id)?;
        definition.id = old_id;
        if definition.start_date.is_none() {
            definition.start_date = group.definition.start_date;
        }
        validate_class(&definition).map_err(ScheduleError::Validation)?;

        let anchor = self.anchor(&definition);
        let days = definition.occurrence_days();
        let mut report = MutationReport::new(old_id);
        let mut failures = Vec::new();

        for &(day, id) in group.rows.iter().filter(|(day, _)| days.contains(day)) {
            let stored_date = self.rows.get(&id).map_or(anchor, |r| r.start_time.date());
            let row = ScheduleRow::from_definition(&definition, day, stored_date);
            if self.rows.get(&id) == Some(&row) {
                continue;
            }
            let result = self.call("update_schedule", self.api.update_schedule(id, &row)).await;
            match result {
                Ok(()) => {
                    self.rows.insert(id, row);
                    report.updated.push((day, id));
                }
                Err(e) => failures.push((day, e)),
            }
        }

        for &day in days.iter().filter(|day| group.row_for(**day).is_none()) {
            let row = ScheduleRow::from_definition(&definition, day, anchor);
            let result = self.call("create_schedule", self.api.create_schedule(&row)).await;
            match result {
                Ok(id) => {
                    self.rows.insert(id, row);
                    report.created.push((day, id));
                }
                Err(e) => failures.push((day, e)),
            }
        }

        for &(day, id) in group.rows.iter().filter(|(day, _)| !days.contains(day)) {
            let result = self.call("delete_schedule", self.api.delete_schedule(id)).await;
            match result {
                Ok(()) => {
                    self.rows.remove(&id);
                    report.deleted.push((day, id));
                }
                Err(e) => failures.push((day, e)),
            }
        }

        report.instances = self.calendar.expander().expand(&definition, anchor);
        self.finish("update", report, failures)
    }

    /// Deletes every stored row of class `id`.
    ///
    /// ## Errors
    /// - [`ScheduleError::NotFound`] if no stored class has `id`.
    /// - The first call error if no row was deleted.
    /// - [`ScheduleError::PartialFailure`] if only some rows were deleted.
    pub async fn delete(&mut self, id: Uuid) -> ScheduleResult<MutationReport> {
        let group = self.group(id)?;
        let mut report = MutationReport::new(id);
        let mut failures = Vec::new();

        for &(day, row_id) in &group.rows {
            let result = self.call("delete_schedule", self.api.delete_schedule(row_id)).await;
            match result {
                Ok(()) => {
                    self.rows.remove(&row_id);
                    report.deleted.push((day, row_id));
                }
                Err(e) => failures.push((day, e)),
            }
        }

        self.finish("delete", report, failures)
    }

    fn group(&self, id: Uuid) -> ScheduleResult<RowGroup> {
        self.groups()
            .into_iter()
            .find(|g| g.definition.id == id)
            .ok_or_else(|| ScheduleError::NotFound(format!("class {}", id)))
    }

    fn anchor(&self, definition: &ClassDefinition) -> NaiveDate {
        definition.start_date.unwrap_or(self.calendar.reference_week)
    }

    async fn call<T>(
        &self,
        op: &str,
        fut: impl Future<Output = ScheduleResult<T>>,
    ) -> ScheduleResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout_ms = self.timeout.as_millis() as u64, "Schedule API call timed out");
                Err(ScheduleError::Network(format!(
                    "{} timed out after {} ms",
                    op,
                    self.timeout.as_millis()
                )))
            }
        }
    }

    fn finish(
        &self,
        op: &str,
        report: MutationReport,
        failures: Vec<(RecurringDay, ScheduleError)>,
    ) -> ScheduleResult<MutationReport> {
        let succeeded = report.changes();
        let attempted = succeeded + failures.len();

        for (day, error) in &failures {
            warn!(op, class_id = %report.definition_id, day = %day, error = %error, "Row change failed");
        }

        if failures.is_empty() {
            info!(op, class_id = %report.definition_id, changes = succeeded, "Class stored");
            return Ok(report);
        }

        let failed_days: Vec<RecurringDay> = failures.iter().map(|(day, _)| *day).collect();
        match (succeeded, failures.into_iter().next()) {
            (0, Some((_, first))) => Err(first),
            _ => Err(ScheduleError::PartialFailure {
                succeeded,
                attempted,
                failed_days,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekNumbering;
    use crate::conflict::ConflictKind;
    use crate::models::{AbDay, DayValue};
    use crate::validation::ValidationErrorKind;
    use chrono::NaiveTime;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn math() -> ClassDefinition {
        ClassDefinition::new("Math", 7, "204", hm(9, 0), hm(9, 50))
            .with_days([RecurringDay::MONDAY, RecurringDay::WEDNESDAY, RecurringDay::FRIDAY])
            .with_grade("5")
            .with_teacher_name("Ms. Rivera")
    }

    fn availability(day: &str, start: &str, end: &str) -> AvailabilityRecord {
        AvailabilityRecord {
            teacher_id: 7,
            day_of_week: DayValue::from(day),
            start_time: start.into(),
            end_time: end.into(),
        }
    }

    fn orchestrator(api: &InMemoryScheduleApi) -> ScheduleOrchestrator<InMemoryScheduleApi> {
        ScheduleOrchestrator::new(api.clone())
    }

    #[test_log::test(tokio::test)]
    async fn test_save_creates_one_row_per_day() {
        let api = InMemoryScheduleApi::new();
        let mut orch = orchestrator(&api);
        let class = math();

        let report = orch.save(class.clone()).await.unwrap();
        assert_eq!(report.created.len(), 3);
        assert_eq!(report.instances.len(), 3);
        assert_eq!(api.rows().len(), 3);
        assert_eq!(orch.rows(), &api.rows());

        let definitions = orch.definitions();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].id, class.id);
        assert_eq!(definitions[0].recurring_days, class.recurring_days);
        // rows land in the reference week
        assert_eq!(definitions[0].start_date, Some(d(2024, 1, 1)));
    }

    #[test_log::test(tokio::test)]
    async fn test_save_rejects_invalid() {
        let api = InMemoryScheduleApi::new();
        let mut orch = orchestrator(&api);
        let class = ClassDefinition::new("Math", 7, "", hm(10, 0), hm(9, 0))
            .with_days([RecurringDay::MONDAY]);

        let err = orch.save(class).await.unwrap_err();
        assert!(matches!(err, ScheduleError::Validation(ref errors) if errors.len() == 2));
        assert!(api.calls().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_save_partial_failure_keeps_successes() {
        let api = InMemoryScheduleApi::new();
        api.fail_on_day(RecurringDay::FRIDAY);
        let mut orch = orchestrator(&api);

        let err = orch.save(math()).await.unwrap_err();
        match &err {
            ScheduleError::PartialFailure {
                succeeded,
                attempted,
                failed_days,
            } => {
                assert_eq!((*succeeded, *attempted), (2, 3));
                assert_eq!(failed_days, &vec![RecurringDay::FRIDAY]);
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
        assert!(err.to_string().starts_with("Successfully saved 2 of 3 changes"));

        // no rollback
        assert_eq!(api.rows().len(), 2);
        assert_eq!(orch.rows().len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_save_total_failure_returns_first_error() {
        let api = InMemoryScheduleApi::new();
        for day in RecurringDay::ALL {
            api.fail_on_day(day);
        }
        let mut orch = orchestrator(&api);

        let err = orch.save(math()).await.unwrap_err();
        assert!(matches!(err, ScheduleError::Api { status: 500, .. }));
        assert!(err.to_string().contains("Monday"));
        assert!(orch.rows().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_calls_are_sequential_in_day_order() {
        let api = InMemoryScheduleApi::new();
        let mut orch = orchestrator(&api);
        orch.save(math()).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![
                ApiCall::Create(RecurringDay::MONDAY),
                ApiCall::Create(RecurringDay::WEDNESDAY),
                ApiCall::Create(RecurringDay::FRIDAY),
            ]
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_update_patches_only_changed_days() {
        let api = InMemoryScheduleApi::new();
        let mut orch = orchestrator(&api);
        let class = math();
        let saved = orch.save(class.clone()).await.unwrap();
        let row_id = |day| saved.created.iter().find(|(d, _)| *d == day).unwrap().1;
        api.clear_calls();

        // drop Friday, add Tuesday, keep Monday and Wednesday unchanged
        let edited = class
            .clone()
            .with_days([RecurringDay::MONDAY, RecurringDay::TUESDAY, RecurringDay::WEDNESDAY]);
        let report = orch.update(class.id, edited).await.unwrap();

        assert!(report.updated.is_empty());
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.deleted, vec![(RecurringDay::FRIDAY, row_id(RecurringDay::FRIDAY))]);
        assert_eq!(
            api.calls(),
            vec![
                ApiCall::Create(RecurringDay::TUESDAY),
                ApiCall::Delete(row_id(RecurringDay::FRIDAY)),
            ]
        );

        // Monday row keeps its id
        assert!(orch.rows().contains_key(&row_id(RecurringDay::MONDAY)));
        assert_eq!(orch.definitions().len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_update_patches_in_place_before_deleting() {
        let api = InMemoryScheduleApi::new();
        let mut orch = orchestrator(&api);
        let class = math();
        orch.save(class.clone()).await.unwrap();
        api.clear_calls();

        let mut moved = class.clone().with_days([RecurringDay::MONDAY, RecurringDay::THURSDAY]);
        moved.room = "105".into();
        let report = orch.update(class.id, moved).await.unwrap();

        assert_eq!(report.updated.len(), 1);
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.deleted.len(), 2);

        let calls = api.calls();
        assert!(matches!(calls[0], ApiCall::Update(_, RecurringDay::MONDAY)));
        assert_eq!(calls[1], ApiCall::Create(RecurringDay::THURSDAY));
        assert!(matches!(calls[2], ApiCall::Delete(_)));
        assert!(api.rows().values().all(|r| r.room == "105"));
    }

    #[test_log::test(tokio::test)]
    async fn test_update_unknown_class() {
        let api = InMemoryScheduleApi::new();
        let mut orch = orchestrator(&api);
        let err = orch.update(Uuid::new_v4(), math()).await.unwrap_err();
        assert!(matches!(err, ScheduleError::NotFound(_)));
    }

    #[test_log::test(tokio::test)]
    async fn test_update_partial_failure() {
        let api = InMemoryScheduleApi::new();
        let mut orch = orchestrator(&api);
        let class = math();
        orch.save(class.clone()).await.unwrap();
        api.fail_on_day(RecurringDay::TUESDAY);

        let edited = class.clone().with_days([RecurringDay::MONDAY, RecurringDay::TUESDAY]);
        let err = orch.update(class.id, edited).await.unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::PartialFailure { succeeded: 2, attempted: 3, .. }
        ));
        // Wednesday and Friday were still removed, Monday kept
        assert_eq!(api.rows().len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_removes_group() {
        let api = InMemoryScheduleApi::new();
        let mut orch = orchestrator(&api);
        let class = math();
        let art = ClassDefinition::new("Art", 3, "12", hm(13, 0), hm(14, 0))
            .with_days([RecurringDay::TUESDAY]);
        orch.save(class.clone()).await.unwrap();
        orch.save(art.clone()).await.unwrap();

        let report = orch.delete(class.id).await.unwrap();
        assert_eq!(report.deleted.len(), 3);
        assert_eq!(api.rows().len(), 1);
        assert_eq!(orch.definitions()[0].id, art.id);

        assert!(matches!(
            orch.delete(class.id).await,
            Err(ScheduleError::NotFound(_))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_load_groups_legacy_rows() {
        let api = InMemoryScheduleApi::new()
            .with_availability([availability("Monday", "08:00", "12:00")]);
        let class = math().with_ab_constraint(AbDay::A);
        for day in [RecurringDay::MONDAY, RecurringDay::WEDNESDAY] {
            api.insert_row(ScheduleRow {
                class_group_id: None,
                ..ScheduleRow::from_definition(&class, day, d(2024, 3, 4))
            });
        }

        let mut orch = orchestrator(&api);
        orch.load().await;

        let definitions = orch.definitions();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].recurring_days.len(), 2);
        assert_eq!(definitions[0].ab_constraint, Some(AbDay::A));
        assert_eq!(orch.availability().len(), 1);

        // editing adopts the legacy rows under their derived id
        let legacy_id = definitions[0].id;
        let report = orch
            .update(legacy_id, definitions[0].clone().with_description("Room moved"))
            .await
            .unwrap();
        assert_eq!(report.updated.len(), 2);
        assert!(api
            .rows()
            .values()
            .all(|r| r.class_group_id == Some(legacy_id)));
    }

    #[test_log::test(tokio::test)]
    async fn test_load_degrades_to_empty() {
        let api = InMemoryScheduleApi::new()
            .with_availability([availability("Monday", "08:00", "12:00")]);
        api.insert_row(ScheduleRow::from_definition(&math(), RecurringDay::MONDAY, d(2024, 3, 4)));
        api.set_fail_reads(true);

        let mut orch = orchestrator(&api);
        orch.load().await;
        assert!(orch.rows().is_empty());
        assert!(orch.availability().is_empty());
        assert!(orch.instances_for_week(d(2024, 3, 4)).is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_call_timeout_is_network_error() {
        let api = InMemoryScheduleApi::new().with_latency(Duration::from_millis(200));
        let mut orch = orchestrator(&api).with_timeout(Duration::from_millis(20));

        let err = orch.save(math()).await.unwrap_err();
        assert!(matches!(err, ScheduleError::Network(ref msg) if msg.contains("timed out")));
        assert!(orch.rows().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_save_checked_requires_confirmation() {
        let api = InMemoryScheduleApi::new().with_availability([
            availability("Monday", "08:00", "12:00"),
            availability("Wednesday", "08:00", "12:00"),
            availability("Friday", "08:00", "12:00"),
        ]);
        let mut orch = orchestrator(&api);
        orch.load().await;
        orch.save_checked(math(), false).await.unwrap();

        let clash = ClassDefinition::new("Reading", 7, "110", hm(9, 30), hm(10, 0))
            .with_days([RecurringDay::WEDNESDAY]);
        let conflicts = orch.check(&clash).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::TeacherDoubleBooked);

        let err = orch.save_checked(clash.clone(), false).await.unwrap_err();
        assert!(matches!(err, ScheduleError::Conflict(ref c) if c.len() == 1));
        assert_eq!(api.rows().len(), 3);

        orch.save_checked(clash, true).await.unwrap();
        assert_eq!(api.rows().len(), 4);

        let flagged: Vec<_> = orch
            .instances_for_week(d(2024, 1, 1))
            .into_iter()
            .filter(|i| i.has_conflict)
            .collect();
        assert_eq!(flagged.len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_save_rejects_stored_id() {
        let api = InMemoryScheduleApi::new();
        let mut orch = orchestrator(&api);
        let class = math();
        orch.save(class.clone()).await.unwrap();
        api.clear_calls();

        let err = orch.save(class).await.unwrap_err();
        match err {
            ScheduleError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].kind, ValidationErrorKind::DuplicateId);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(api.calls().is_empty());
        assert_eq!(api.rows().len(), 3);
        assert_eq!(orch.groups()[0].rows.len(), 3);
    }

    #[test_log::test(tokio::test)]
    async fn test_partial_update_shows_stored_times() {
        let api = InMemoryScheduleApi::new();
        let mut orch = orchestrator(&api);
        let class = ClassDefinition::new("Math", 7, "204", hm(9, 0), hm(9, 50))
            .with_days([RecurringDay::MONDAY, RecurringDay::WEDNESDAY]);
        orch.save(class.clone()).await.unwrap();
        api.fail_on_day(RecurringDay::MONDAY);

        let mut later = class.clone();
        later.start_time = hm(10, 0);
        later.end_time = hm(10, 50);
        let err = orch.update(class.id, later).await.unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::PartialFailure { succeeded: 1, attempted: 2, .. }
        ));

        // Monday kept its old time, Wednesday moved
        let times: Vec<_> = orch
            .instances_for_week(d(2024, 1, 1))
            .iter()
            .map(|i| (i.start, i.end))
            .collect();
        assert_eq!(
            times,
            vec![
                (d(2024, 1, 1).and_time(hm(9, 0)), d(2024, 1, 1).and_time(hm(9, 50))),
                (d(2024, 1, 3).and_time(hm(10, 0)), d(2024, 1, 3).and_time(hm(10, 50))),
            ]
        );

        let reading = ClassDefinition::new("Reading", 7, "110", hm(10, 0), hm(10, 30))
            .with_days([RecurringDay::WEDNESDAY]);
        let double_booked: Vec<_> = orch
            .check(&reading)
            .unwrap()
            .into_iter()
            .filter(|c| c.kind == ConflictKind::TeacherDoubleBooked)
            .collect();
        assert_eq!(double_booked.len(), 1);
        assert_eq!(double_booked[0].day, RecurringDay::WEDNESDAY);
    }

    #[test_log::test(tokio::test)]
    async fn test_update_skips_unchanged_rows_across_weeks() {
        let api = InMemoryScheduleApi::new();
        let class = math();
        let monday = ScheduleRow::from_definition(&class, RecurringDay::MONDAY, d(2024, 3, 4));
        let wednesday =
            ScheduleRow::from_definition(&class, RecurringDay::WEDNESDAY, d(2024, 3, 11));
        let friday = ScheduleRow::from_definition(&class, RecurringDay::FRIDAY, d(2024, 4, 1));
        for row in [monday, wednesday, friday] {
            api.insert_row(row);
        }
        let before = api.rows();

        let mut orch = orchestrator(&api);
        orch.load().await;
        api.clear_calls();

        let report = orch.update(class.id, class.clone()).await.unwrap();
        assert_eq!(report.changes(), 0);
        assert!(api.calls().is_empty());
        assert_eq!(api.rows(), before);
    }

    #[test_log::test(tokio::test)]
    async fn test_sunday_start_numbering_labels_instances() {
        let api = InMemoryScheduleApi::new();
        let calendar = CalendarConfig {
            week_numbering: WeekNumbering::SundayStart,
            ..CalendarConfig::default()
        };
        let mut orch = orchestrator(&api).with_calendar(calendar);
        let class = ClassDefinition::new("Band", 2, "Hall", hm(14, 0), hm(15, 0))
            .with_days([RecurringDay::FRIDAY]);
        orch.save(class).await.unwrap();

        let instances = orch.instances_for_week(d(2027, 1, 8));
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].ab_day, Some(AbDay::A));
    }
}
