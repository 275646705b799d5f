//! Platform-facing endpoints.
//!
//! The trigger service invokes `/internal/v1/execute` on every fire with
//! the payload it was configured with at schedule write time. An external
//! operational timer (or an operator) invokes `/internal/v1/reconcile` to
//! repair trigger drift. Neither route carries a user identity.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::ApiError;
use crate::scheduler::{reconcile_triggers, ExecutionInput, ExecutionReport, ReconcileReport};
use crate::AppState;

/// Internal routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/internal/v1/execute", post(execute))
        .route("/internal/v1/reconcile", post(reconcile))
}

/// Trigger-fire payload as delivered by the trigger service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    /// Schedule being executed.
    pub schedule_id: Option<String>,
    /// Owner of the schedule.
    pub owner_id: Option<String>,
    /// Recipient for the result email.
    #[serde(default)]
    pub recipient_email: Option<String>,
    /// Prompt snapshot.
    pub prompt: Option<String>,
    /// Whether to attempt email delivery.
    #[serde(default)]
    pub notify_by_email: Option<bool>,
}

/// Execute one trigger fire.
///
/// The engine itself is fire-and-forget; only a malformed payload is an
/// error here.
///
/// # Endpoint
///
/// `POST /internal/v1/execute`
pub async fn execute(
    State(state): State<AppState>,
    Json(req): Json<ExecuteRequest>,
) -> Result<Json<ExecutionReport>, ApiError> {
    let (Some(schedule_id), Some(owner_id), Some(prompt)) =
        (req.schedule_id, req.owner_id, req.prompt)
    else {
        return Err(ApiError::Validation(
            "Missing required fields: scheduleId, ownerId, prompt".to_string(),
        ));
    };
    if prompt.trim().is_empty() {
        return Err(ApiError::Validation("prompt must not be empty".to_string()));
    }

    let report = state
        .engine
        .execute(ExecutionInput {
            schedule_id,
            owner_id,
            recipient_email: req.recipient_email,
            prompt,
            notify_by_email: req.notify_by_email.unwrap_or(true),
        })
        .await;

    Ok(Json(report))
}

/// Run one reconciliation pass.
///
/// # Endpoint
///
/// `POST /internal/v1/reconcile`
pub async fn reconcile(
    State(state): State<AppState>,
) -> Result<Json<ReconcileReport>, ApiError> {
    let report = reconcile_triggers(&state.manager).await?;
    Ok(Json(report))
}
