//! Error taxonomy and HTTP mapping.
//!
//! User-facing CRUD operations surface validation and not-found errors
//! directly. Trigger-service errors are fatal only at creation time;
//! everywhere else they are logged and tolerated. Execution-time
//! generation errors are captured into the ExecutionResult rather than
//! thrown, and notification errors never escalate past
//! `emailSent = false`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::scheduler::CadenceError;
use crate::store::StoreError;

/// Service-level errors, mapped onto HTTP statuses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input, including an untranslatable cadence.
    #[error("{0}")]
    Validation(String),
    /// Missing or invalid identity.
    #[error("Unauthorized")]
    Auth,
    /// Unknown schedule, or a schedule owned by someone else. The two are
    /// deliberately indistinguishable so existence is never confirmed to a
    /// non-owner.
    #[error("Schedule not found")]
    NotFound,
    /// An external collaborator failed while blocking the primary
    /// operation.
    #[error("upstream service unavailable: {0}")]
    Upstream(String),
    /// Catch-all for unexpected failures.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<CadenceError> for ApiError {
    fn from(err: CadenceError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Auth => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            Self::NotFound => (StatusCode::NOT_FOUND, "Schedule not found".to_string()),
            Self::Upstream(message) => {
                tracing::error!(error = %message, "Upstream failure blocked the request");
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        let cases = [
            (ApiError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ApiError::Auth, StatusCode::UNAUTHORIZED),
            (ApiError::NotFound, StatusCode::NOT_FOUND),
            (
                ApiError::Upstream("trigger service".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn cadence_errors_become_validation_errors() {
        let err: ApiError = CadenceError::EmptyDays.into();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
