//! Persistence seam for schedule rows and teacher availability.

use async_trait::async_trait;

use super::rows::{AvailabilityRecord, RowId, ScheduleRow, StoredRow};
use crate::error::ScheduleResult;

/// Remote schedule storage.
///
/// Every call is independent; the backend offers no transactions, so
/// callers must tolerate any call failing after earlier ones succeeded.
#[async_trait]
pub trait ScheduleApi: Send + Sync {
    /// Stores a new weekday row and returns its id.
    async fn create_schedule(&self, row: &ScheduleRow) -> ScheduleResult<RowId>;

    /// Replaces the row stored under `id`.
    async fn update_schedule(&self, id: RowId, row: &ScheduleRow) -> ScheduleResult<()>;

    async fn delete_schedule(&self, id: RowId) -> ScheduleResult<()>;

    async fn list_schedules(&self) -> ScheduleResult<Vec<StoredRow>>;

    async fn list_teacher_availabilities(&self) -> ScheduleResult<Vec<AvailabilityRecord>>;
}
