//! Cursor-based retrieval of execution history.
//!
//! The cursor is an exact, losslessly round-trippable encoding of the
//! store's continuation position: base64 over the JSON of the last
//! returned result key. Feeding an unmodified cursor back resumes exactly
//! where the previous page ended, with no duplicate or skipped items.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;

use super::{ExecutionResult, Frequency, Schedule};
use crate::error::ApiError;
use crate::store::{ResultKey, ScheduleStore};

/// Page size when the caller does not specify a limit.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Condensed view of the parent schedule, embedded in every results page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    /// Current prompt.
    pub prompt: String,
    /// Cadence frequency.
    pub frequency: Frequency,
    /// Time of day.
    pub time: String,
    /// Active/paused flag.
    pub is_active: bool,
    /// Completed executions.
    pub run_count: u64,
    /// Most recent execution timestamp.
    pub last_run_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Schedule> for ScheduleSummary {
    fn from(schedule: &Schedule) -> Self {
        Self {
            prompt: schedule.prompt.clone(),
            frequency: schedule.frequency,
            time: schedule.time.clone(),
            is_active: schedule.is_active,
            run_count: schedule.run_count,
            last_run_at: schedule.last_run_at,
        }
    }
}

/// One page of a schedule's execution history, most recent first.
#[derive(Debug, Clone)]
pub struct ResultsPage {
    /// Results in this page.
    pub results: Vec<ExecutionResult>,
    /// Summary of the parent schedule.
    pub schedule: ScheduleSummary,
    /// Opaque continuation token when more results remain.
    pub next_cursor: Option<String>,
}

/// Pages through a schedule's execution results.
pub struct ResultsPager {
    store: Arc<dyn ScheduleStore>,
}

impl std::fmt::Debug for ResultsPager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultsPager").finish()
    }
}

impl ResultsPager {
    /// Create a pager over the given store.
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    /// Fetch one page of results for a schedule the caller owns.
    pub async fn fetch(
        &self,
        owner_id: &str,
        schedule_id: &str,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<ResultsPage, ApiError> {
        let schedule = self
            .store
            .get_schedule(owner_id, schedule_id)
            .await?
            .ok_or(ApiError::NotFound)?;

        let start_after = cursor.map(decode_cursor).transpose()?;
        let batch = self
            .store
            .query_results(
                schedule_id,
                limit.unwrap_or(DEFAULT_PAGE_SIZE),
                start_after.as_ref(),
            )
            .await?;

        Ok(ResultsPage {
            results: batch.items,
            schedule: ScheduleSummary::from(&schedule),
            next_cursor: batch.last_key.as_ref().map(encode_cursor),
        })
    }
}

/// Encode a continuation key into an opaque cursor.
fn encode_cursor(key: &ResultKey) -> String {
    // ResultKey serialization cannot fail; the type is plain data.
    let json = serde_json::to_vec(key).unwrap_or_default();
    BASE64.encode(json)
}

/// Decode an opaque cursor back into a continuation key.
fn decode_cursor(cursor: &str) -> Result<ResultKey, ApiError> {
    let bytes = BASE64
        .decode(cursor)
        .map_err(|_| ApiError::Validation("invalid cursor".to_string()))?;
    serde_json::from_slice(&bytes).map_err(|_| ApiError::Validation("invalid cursor".to_string()))
}
