//! In-memory [`ScheduleApi`] for tests and local development.
//!
//! Rows live in an `Arc<RwLock<..>>`, so a clone handed to an orchestrator
//! can still be inspected and steered from the test that created it.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::api::ScheduleApi;
use super::rows::{AvailabilityRecord, RowId, ScheduleRow, StoredRow};
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::RecurringDay;

/// A call received by [`InMemoryScheduleApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Create(RecurringDay),
    Update(RowId, RecurringDay),
    Delete(RowId),
    ListSchedules,
    ListAvailabilities,
}

#[derive(Default)]
struct MemoryData {
    rows: BTreeMap<RowId, ScheduleRow>,
    availability: Vec<AvailabilityRecord>,
    next_id: RowId,
    calls: Vec<ApiCall>,
    failing_days: Vec<RecurringDay>,
    fail_reads: bool,
    latency: Option<Duration>,
}

/// Schedule storage held in process memory.
#[derive(Clone, Default)]
pub struct InMemoryScheduleApi {
    data: Arc<RwLock<MemoryData>>,
}

impl InMemoryScheduleApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds availability records returned by `list_teacher_availabilities`.
    pub fn with_availability(self, records: impl IntoIterator<Item = AvailabilityRecord>) -> Self {
        self.write().availability.extend(records);
        self
    }

    /// Delays every call, for exercising timeouts.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.write().latency = Some(latency);
        self
    }

    /// Makes creates and updates of rows for `day` fail with a 500.
    pub fn fail_on_day(&self, day: RecurringDay) {
        self.write().failing_days.push(day);
    }

    /// Makes both list calls fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.write().fail_reads = fail;
    }

    /// Stores a row directly, bypassing the call log. Returns its id.
    pub fn insert_row(&self, row: ScheduleRow) -> RowId {
        let mut data = self.write();
        data.next_id += 1;
        let id = data.next_id;
        data.rows.insert(id, row);
        id
    }

    /// Snapshot of the stored rows.
    pub fn rows(&self) -> BTreeMap<RowId, ScheduleRow> {
        self.read().rows.clone()
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.read().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.write().calls.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    async fn record(&self, call: ApiCall) {
        let latency = {
            let mut data = self.write();
            data.calls.push(call);
            data.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_day(&self, day: RecurringDay) -> ScheduleResult<()> {
        if self.read().failing_days.contains(&day) {
            return Err(ScheduleError::Api {
                status: 500,
                message: format!("Could not store {} row", day),
            });
        }
        Ok(())
    }

    fn check_reads(&self) -> ScheduleResult<()> {
        if self.read().fail_reads {
            return Err(ScheduleError::Network("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduleApi for InMemoryScheduleApi {
    async fn create_schedule(&self, row: &ScheduleRow) -> ScheduleResult<RowId> {
        self.record(ApiCall::Create(row.recurring_day)).await;
        self.check_day(row.recurring_day)?;
        Ok(self.insert_row(row.clone()))
    }

    async fn update_schedule(&self, id: RowId, row: &ScheduleRow) -> ScheduleResult<()> {
        self.record(ApiCall::Update(id, row.recurring_day)).await;
        self.check_day(row.recurring_day)?;

        let mut data = self.write();
        match data.rows.get_mut(&id) {
            Some(stored) => {
                *stored = row.clone();
                Ok(())
            }
            None => Err(ScheduleError::Api {
                status: 404,
                message: format!("Schedule {} not found", id),
            }),
        }
    }

    async fn delete_schedule(&self, id: RowId) -> ScheduleResult<()> {
        self.record(ApiCall::Delete(id)).await;

        match self.write().rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ScheduleError::Api {
                status: 404,
                message: format!("Schedule {} not found", id),
            }),
        }
    }

    async fn list_schedules(&self) -> ScheduleResult<Vec<StoredRow>> {
        self.record(ApiCall::ListSchedules).await;
        self.check_reads()?;

        Ok(self
            .read()
            .rows
            .iter()
            .map(|(id, row)| StoredRow {
                id: *id,
                row: row.clone(),
            })
            .collect())
    }

    async fn list_teacher_availabilities(&self) -> ScheduleResult<Vec<AvailabilityRecord>> {
        self.record(ApiCall::ListAvailabilities).await;
        self.check_reads()?;

        Ok(self.read().availability.clone())
    }
}
