//! Durable storage for schedules and execution results.
//!
//! The service consumes the key-value store through the narrow
//! [`ScheduleStore`] trait. Schedules are keyed `(ownerId, scheduleId)`;
//! results are keyed `(scheduleId, executedAt, resultId)` so a single query
//! walks one schedule's history in chronological order. A secondary index
//! lists active schedules across owners for reconciliation.

pub mod memory;

pub use memory::InMemoryScheduleStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scheduler::{ExecutionResult, Schedule};

/// Largest number of items one batch delete may carry, mirroring the
/// backing store's batch-write constraint.
pub const MAX_BATCH_WRITE: usize = 25;

/// Errors surfaced by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("store backend error: {0}")]
    Backend(String),
    /// A batch delete exceeded [`MAX_BATCH_WRITE`] items.
    #[error("batch of {0} items exceeds the {MAX_BATCH_WRITE}-item batch-write limit")]
    BatchTooLarge(usize),
}

/// Continuation position within one schedule's result history.
///
/// Serialized into the opaque pagination cursor; decoding an unmodified
/// key must resume exactly where the previous page ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultKey {
    /// Sort-key timestamp of the last item already returned.
    pub executed_at: chrono::DateTime<chrono::Utc>,
    /// Tie-breaker for results sharing a timestamp.
    pub result_id: String,
}

impl ResultKey {
    /// Key of a stored result.
    #[must_use]
    pub fn of(result: &ExecutionResult) -> Self {
        Self {
            executed_at: result.executed_at,
            result_id: result.result_id.clone(),
        }
    }
}

/// One page of results from [`ScheduleStore::query_results`].
#[derive(Debug, Clone)]
pub struct ResultBatch {
    /// Results, most recent first.
    pub items: Vec<ExecutionResult>,
    /// Continuation key when more results remain.
    pub last_key: Option<ResultKey>,
}

/// Narrow interface over the durable key-value store.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Write a schedule record, replacing any previous version.
    async fn put_schedule(&self, schedule: &Schedule) -> Result<(), StoreError>;

    /// Fetch a schedule by owner and id.
    async fn get_schedule(
        &self,
        owner_id: &str,
        schedule_id: &str,
    ) -> Result<Option<Schedule>, StoreError>;

    /// List all schedules owned by one identity, newest first.
    async fn list_schedules(&self, owner_id: &str) -> Result<Vec<Schedule>, StoreError>;

    /// Delete a schedule record. Returns whether it existed.
    async fn delete_schedule(&self, owner_id: &str, schedule_id: &str)
        -> Result<bool, StoreError>;

    /// List all active schedules across owners (secondary index).
    async fn list_active(&self) -> Result<Vec<Schedule>, StoreError>;

    /// Append one execution result.
    async fn put_result(&self, result: &ExecutionResult) -> Result<(), StoreError>;

    /// Page through a schedule's results, most recent first.
    ///
    /// `start_after` is exclusive: the page begins with the result
    /// immediately older than the given key.
    async fn query_results(
        &self,
        schedule_id: &str,
        limit: usize,
        start_after: Option<&ResultKey>,
    ) -> Result<ResultBatch, StoreError>;

    /// Enumerate every result key for a schedule (cascade deletion).
    async fn list_result_keys(&self, schedule_id: &str) -> Result<Vec<ResultKey>, StoreError>;

    /// Delete up to [`MAX_BATCH_WRITE`] results in one batch.
    async fn delete_results(
        &self,
        schedule_id: &str,
        keys: &[ResultKey],
    ) -> Result<(), StoreError>;

    /// Record a completed run: set `lastRunAt` and increment `runCount` by
    /// exactly one in a single conditional update.
    ///
    /// The increment initializes an absent counter and is safe under
    /// concurrent executions of the same schedule. Returns `false` when the
    /// schedule no longer exists (deleted mid-run).
    async fn record_run(
        &self,
        owner_id: &str,
        schedule_id: &str,
        executed_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool, StoreError>;
}
