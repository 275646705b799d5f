//! Schedule lifecycle and execution accounting.
//!
//! This module owns the core of Sundial: translating a human cadence into a
//! trigger expression, keeping the durable Schedule record and the external
//! trigger service in agreement, running one execution per trigger fire, and
//! paging through execution history.

pub mod cadence;
pub mod executor;
pub mod manager;
pub mod reconcile;
pub mod results;

pub use cadence::{build_trigger_expression, CadenceError};
pub use executor::{ExecutionEngine, ExecutionReport};
pub use manager::ScheduleManager;
pub use reconcile::{reconcile_triggers, ReconcileReport};
pub use results::{ResultsPage, ResultsPager, ScheduleSummary};

use serde::{Deserialize, Serialize};

/// How often a schedule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day at the configured time.
    Daily,
    /// On the configured weekdays at the configured time.
    Weekly,
    /// On the 1st of every month at the configured time.
    Monthly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

/// A durable schedule record pairing a prompt with a recurring cadence.
///
/// The record is the single source of truth for `active`; the external
/// trigger's enabled state is a projection of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Unique schedule ID, assigned at creation.
    pub schedule_id: String,
    /// Identity of the creator; all access is scoped to this.
    pub owner_id: String,
    /// Email captured from the authenticated identity at creation.
    pub recipient_email: Option<String>,
    /// The prompt sent to the generation backend on every fire.
    pub prompt: String,
    /// Cadence frequency.
    pub frequency: Frequency,
    /// Time of day, 24-hour "HH:MM", in the configured timezone.
    pub time: String,
    /// Weekday names; meaningful only when `frequency` is weekly.
    #[serde(default)]
    pub days: Vec<String>,
    /// Optional date after which the trigger must stop firing.
    pub end_date: Option<chrono::NaiveDate>,
    /// Whether results should be emailed to `recipient_email`.
    pub notify_by_email: bool,
    /// Active/paused flag; drives the trigger's enabled state.
    pub is_active: bool,
    /// Completed executions, incremented only by the Execution Engine.
    pub run_count: u64,
    /// Timestamp of the most recent execution.
    pub last_run_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Creation timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last update timestamp.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Outcome of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// The generation backend returned text.
    Success,
    /// The generation backend failed.
    Failed,
}

/// Immutable record of one completed run of a schedule.
///
/// Append-only; deleting the parent schedule cascades to its results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Unique result ID.
    pub result_id: String,
    /// Parent schedule.
    pub schedule_id: String,
    /// Copy of the prompt at run time.
    pub prompt: String,
    /// Generated output; empty when the run failed.
    pub response: String,
    /// Success/failure of the generation step.
    pub status: RunStatus,
    /// Error message, present only when `status` is failed.
    pub error: Option<String>,
    /// Whether the notification was delivered.
    pub email_sent: bool,
    /// When the execution started.
    pub executed_at: chrono::DateTime<chrono::Utc>,
    /// Wall-clock duration of the execution in milliseconds.
    pub duration_ms: u64,
}

/// Invocation payload carried by a trigger and delivered to the
/// Execution Engine on every fire.
///
/// This is a snapshot taken when the trigger was last written; it may be
/// stale relative to later edits because trigger-side updates are
/// best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionInput {
    /// Schedule being executed.
    pub schedule_id: String,
    /// Owner of the schedule.
    pub owner_id: String,
    /// Where to send the result email, if anywhere.
    pub recipient_email: Option<String>,
    /// Prompt snapshot.
    pub prompt: String,
    /// Whether to attempt email delivery.
    pub notify_by_email: bool,
}

impl ExecutionInput {
    /// Build the invocation payload from the current state of a schedule.
    #[must_use]
    pub fn from_schedule(schedule: &Schedule) -> Self {
        Self {
            schedule_id: schedule.schedule_id.clone(),
            owner_id: schedule.owner_id.clone(),
            recipient_email: schedule.recipient_email.clone(),
            prompt: schedule.prompt.clone(),
            notify_by_email: schedule.notify_by_email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Frequency::Daily).unwrap(), "\"daily\"");
        assert_eq!(
            serde_json::from_str::<Frequency>("\"monthly\"").unwrap(),
            Frequency::Monthly
        );
    }

    #[test]
    fn execution_input_snapshots_schedule() {
        let now = chrono::Utc::now();
        let schedule = Schedule {
            schedule_id: "s-1".to_string(),
            owner_id: "u-1".to_string(),
            recipient_email: Some("user@example.com".to_string()),
            prompt: "summarize the news".to_string(),
            frequency: Frequency::Daily,
            time: "09:05".to_string(),
            days: Vec::new(),
            end_date: None,
            notify_by_email: true,
            is_active: true,
            run_count: 3,
            last_run_at: None,
            created_at: now,
            updated_at: now,
        };

        let input = ExecutionInput::from_schedule(&schedule);
        assert_eq!(input.schedule_id, "s-1");
        assert_eq!(input.owner_id, "u-1");
        assert!(input.notify_by_email);
        assert_eq!(input.prompt, "summarize the news");
    }
}
