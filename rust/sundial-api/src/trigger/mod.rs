//! External time-based trigger service.
//!
//! Sundial owns no in-process timer loop; the trigger service owns all
//! timing. Each schedule projects into one uniquely named trigger that
//! carries the cadence expression, the fixed timezone, an enabled flag
//! mirroring the schedule's `active` state, an optional stop date, and the
//! Execution Engine's invocation payload.
//!
//! The Schedule Store and the trigger service share no transaction. The
//! store is authoritative: trigger drift is tolerated and repaired by the
//! reconciliation pass.

pub mod memory;

pub use memory::InMemoryTriggerService;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scheduler::ExecutionInput;

/// Name of the trigger projecting a schedule.
#[must_use]
pub fn trigger_name(schedule_id: &str) -> String {
    format!("sundial-{schedule_id}")
}

/// Errors surfaced by the trigger service.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// No trigger with the given name exists.
    #[error("trigger '{0}' not found")]
    NotFound(String),
    /// The service rejected or failed the operation.
    #[error("trigger service error: {0}")]
    Backend(String),
}

/// A named trigger definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDefinition {
    /// Unique trigger name.
    pub name: String,
    /// Cadence expression produced by the translator.
    pub expression: String,
    /// Timezone the expression is evaluated in.
    pub timezone: String,
    /// Whether the trigger fires; mirrors the schedule's `active` flag.
    pub enabled: bool,
    /// Date after which the trigger stops firing.
    pub end_date: Option<chrono::NaiveDate>,
    /// Payload delivered to the Execution Engine on every fire.
    pub payload: ExecutionInput,
}

/// Narrow interface over the external trigger service.
#[async_trait]
pub trait TriggerService: Send + Sync {
    /// Create a new named trigger.
    async fn create(&self, definition: &TriggerDefinition) -> Result<(), TriggerError>;

    /// Replace an existing trigger's definition.
    async fn update(&self, definition: &TriggerDefinition) -> Result<(), TriggerError>;

    /// Delete a trigger by name.
    async fn delete(&self, name: &str) -> Result<(), TriggerError>;

    /// Fetch a trigger definition, if one exists.
    async fn get(&self, name: &str) -> Result<Option<TriggerDefinition>, TriggerError>;

    /// Enable or disable a trigger without touching the rest of its
    /// definition.
    async fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), TriggerError>;
}
