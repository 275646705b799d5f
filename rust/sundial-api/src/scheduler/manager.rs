//! Schedule manager.
//!
//! Orchestrates CRUD across the Schedule Store and the trigger service and
//! owns the active/paused state machine. The store and the trigger service
//! are independently consistent systems with no shared transaction: the
//! store is elected authoritative, and trigger-side writes after creation
//! are best-effort. The one exception is creation, where a schedule
//! without a trigger can never run, so a trigger-side failure rolls the
//! store write back and fails the request.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::cadence::build_trigger_expression;
use super::{ExecutionInput, Frequency, Schedule};
use crate::error::ApiError;
use crate::store::{ScheduleStore, MAX_BATCH_WRITE};
use crate::trigger::{trigger_name, TriggerDefinition, TriggerError, TriggerService};

/// Fields for a new schedule. Creation always starts active.
#[derive(Debug, Clone)]
pub struct NewSchedule {
    /// Prompt to execute on every fire.
    pub prompt: String,
    /// Cadence frequency.
    pub frequency: Frequency,
    /// Time of day, 24-hour "HH:MM".
    pub time: String,
    /// Weekday names for weekly cadences.
    pub days: Vec<String>,
    /// Optional stop date.
    pub end_date: Option<chrono::NaiveDate>,
    /// Whether to email results. Defaults to true at the API boundary.
    pub notify_by_email: bool,
}

/// Partial update; only provided fields are merged into the stored record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdate {
    /// New prompt.
    pub prompt: Option<String>,
    /// New frequency.
    pub frequency: Option<Frequency>,
    /// New time of day.
    pub time: Option<String>,
    /// New weekday set.
    pub days: Option<Vec<String>>,
    /// New stop date.
    pub end_date: Option<chrono::NaiveDate>,
    /// New email preference.
    pub notify_by_email: Option<bool>,
}

/// Orchestrates schedule lifecycle across the store and trigger service.
pub struct ScheduleManager {
    store: Arc<dyn ScheduleStore>,
    triggers: Arc<dyn TriggerService>,
    timezone: String,
}

impl std::fmt::Debug for ScheduleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleManager")
            .field("timezone", &self.timezone)
            .finish()
    }
}

impl ScheduleManager {
    /// Create a manager over the given adapters.
    ///
    /// `timezone` is the fixed zone all cadence expressions are evaluated
    /// in.
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        triggers: Arc<dyn TriggerService>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            store,
            triggers,
            timezone: timezone.into(),
        }
    }

    /// Create a schedule and its trigger.
    ///
    /// Validates everything before the first write. If the trigger cannot
    /// be created the store write is rolled back and the whole operation
    /// fails: a schedule with no trigger is a dangling record that can
    /// never run.
    pub async fn create(
        &self,
        owner_id: &str,
        recipient_email: Option<String>,
        input: NewSchedule,
    ) -> Result<Schedule, ApiError> {
        if input.prompt.trim().is_empty() {
            return Err(ApiError::Validation("prompt must not be empty".to_string()));
        }
        let expression = build_trigger_expression(input.frequency, &input.time, &input.days)?;

        let now = Utc::now();
        let schedule = Schedule {
            schedule_id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            recipient_email,
            prompt: input.prompt,
            frequency: input.frequency,
            time: input.time,
            days: input.days,
            end_date: input.end_date,
            notify_by_email: input.notify_by_email,
            is_active: true,
            run_count: 0,
            last_run_at: None,
            created_at: now,
            updated_at: now,
        };

        self.store.put_schedule(&schedule).await?;

        let definition = self.trigger_definition(&schedule, expression);
        if let Err(err) = self.triggers.create(&definition).await {
            tracing::error!(
                schedule_id = %schedule.schedule_id,
                error = %err,
                "Trigger creation failed; rolling back schedule record"
            );
            if let Err(rollback_err) = self
                .store
                .delete_schedule(owner_id, &schedule.schedule_id)
                .await
            {
                tracing::error!(
                    schedule_id = %schedule.schedule_id,
                    error = %rollback_err,
                    "Rollback of schedule record failed"
                );
            }
            return Err(ApiError::Upstream(format!("trigger service: {err}")));
        }

        tracing::info!(
            schedule_id = %schedule.schedule_id,
            frequency = %schedule.frequency,
            "Schedule created"
        );
        Ok(schedule)
    }

    /// List the caller's schedules, newest first.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Schedule>, ApiError> {
        Ok(self.store.list_schedules(owner_id).await?)
    }

    /// Fetch one schedule, scoped to the caller.
    ///
    /// A schedule owned by someone else yields the same NotFound as a
    /// nonexistent id.
    pub async fn get(&self, owner_id: &str, schedule_id: &str) -> Result<Schedule, ApiError> {
        self.store
            .get_schedule(owner_id, schedule_id)
            .await?
            .ok_or(ApiError::NotFound)
    }

    /// Merge the provided fields into a schedule and re-sync its trigger.
    ///
    /// The store write is authoritative; a trigger-side failure is logged
    /// and the reconciliation pass converges it later.
    pub async fn update(
        &self,
        owner_id: &str,
        schedule_id: &str,
        changes: ScheduleUpdate,
    ) -> Result<Schedule, ApiError> {
        let mut schedule = self.get(owner_id, schedule_id).await?;

        if let Some(prompt) = changes.prompt {
            if prompt.trim().is_empty() {
                return Err(ApiError::Validation("prompt must not be empty".to_string()));
            }
            schedule.prompt = prompt;
        }
        if let Some(frequency) = changes.frequency {
            schedule.frequency = frequency;
        }
        if let Some(time) = changes.time {
            schedule.time = time;
        }
        if let Some(days) = changes.days {
            schedule.days = days;
        }
        if let Some(end_date) = changes.end_date {
            schedule.end_date = Some(end_date);
        }
        if let Some(notify) = changes.notify_by_email {
            schedule.notify_by_email = notify;
        }

        // Recompute from the merged record so validation covers the
        // combination, not just the changed fields.
        let expression =
            build_trigger_expression(schedule.frequency, &schedule.time, &schedule.days)?;
        schedule.updated_at = Utc::now();

        self.store.put_schedule(&schedule).await?;

        let definition = self.trigger_definition(&schedule, expression);
        best_effort("update", self.triggers.update(&definition).await);

        Ok(schedule)
    }

    /// Flip a schedule between active and paused.
    ///
    /// Toggling twice restores the original state. Only the store write is
    /// authoritative; the trigger's enabled flag follows best-effort.
    pub async fn toggle(&self, owner_id: &str, schedule_id: &str) -> Result<bool, ApiError> {
        let mut schedule = self.get(owner_id, schedule_id).await?;
        schedule.is_active = !schedule.is_active;
        schedule.updated_at = Utc::now();

        self.store.put_schedule(&schedule).await?;

        best_effort(
            "toggle",
            self.triggers
                .set_enabled(&trigger_name(schedule_id), schedule.is_active)
                .await,
        );

        tracing::info!(
            schedule_id,
            is_active = schedule.is_active,
            "Schedule toggled"
        );
        Ok(schedule.is_active)
    }

    /// Delete a schedule, its trigger, and all of its results.
    ///
    /// The trigger is removed first and its absence tolerated (creation may
    /// have failed halfway in the past). Results are cascade-deleted in
    /// batches bounded by the store's batch-write limit.
    pub async fn delete(&self, owner_id: &str, schedule_id: &str) -> Result<(), ApiError> {
        let schedule = self.get(owner_id, schedule_id).await?;

        best_effort(
            "delete",
            self.triggers.delete(&trigger_name(schedule_id)).await,
        );

        self.store
            .delete_schedule(owner_id, &schedule.schedule_id)
            .await?;

        let keys = self.store.list_result_keys(schedule_id).await?;
        for chunk in keys.chunks(MAX_BATCH_WRITE) {
            self.store.delete_results(schedule_id, chunk).await?;
        }

        tracing::info!(schedule_id, results = keys.len(), "Schedule deleted");
        Ok(())
    }

    /// All active schedules across owners, from the secondary index.
    pub(crate) async fn active_schedules(&self) -> Result<Vec<Schedule>, ApiError> {
        Ok(self.store.list_active().await?)
    }

    /// The trigger service adapter (reconciliation needs direct access).
    pub(crate) fn triggers(&self) -> &dyn TriggerService {
        self.triggers.as_ref()
    }

    /// Project a schedule into its trigger definition.
    pub(crate) fn trigger_definition(
        &self,
        schedule: &Schedule,
        expression: String,
    ) -> TriggerDefinition {
        TriggerDefinition {
            name: trigger_name(&schedule.schedule_id),
            expression,
            timezone: self.timezone.clone(),
            enabled: schedule.is_active,
            end_date: schedule.end_date,
            payload: ExecutionInput::from_schedule(schedule),
        }
    }
}

/// Apply the best-effort policy to a trigger-side sync step: log the
/// failure and keep going, because the store remains authoritative.
fn best_effort<T>(operation: &str, result: Result<T, TriggerError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                operation,
                error = %err,
                "Trigger sync failed; reconciliation will converge it"
            );
            None
        }
    }
}
