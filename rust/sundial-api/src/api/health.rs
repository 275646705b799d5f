//! Health check endpoints.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
}

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check response.
#[derive(Debug, Serialize)]
struct ReadinessResponse {
    status: &'static str,
    generation_configured: bool,
    mailer_configured: bool,
}

/// Readiness check: reports whether the external collaborators are
/// configured.
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ready",
        generation_configured: state.config.generation.api_key.is_some(),
        mailer_configured: state.config.mailer.endpoint.is_some(),
    })
}
