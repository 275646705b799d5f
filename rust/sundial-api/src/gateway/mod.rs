//! Identity verification middleware.
//!
//! Every user-facing route requires a verified identity claim supplying
//! the owner id and email. Token issuance lives with the identity
//! provider; this layer only validates HS256 bearer tokens and exposes
//! the caller as [`AuthenticatedUser`]. Internal routes (trigger fires,
//! reconciliation) bypass it — their caller is the platform, not a user.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

/// Identity claims carried in the bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (owner id).
    pub sub: String,
    /// Email address of the subject.
    pub email: Option<String>,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

/// Verified identity extracted from the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Owner id all schedule access is scoped to.
    pub user_id: String,
    /// Email captured from the identity claim.
    pub email: Option<String>,
}

/// Generate an identity token (used by tests and operator tooling).
pub fn generate_token(
    user_id: &str,
    email: Option<&str>,
    secret: &str,
    expiry_secs: u64,
) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(String::from),
        exp: now + expiry_secs as i64,
        iat: now,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Validate an identity token.
pub fn validate_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Middleware requiring a verified identity on the request.
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(ref secret) = state.config.gateway.jwt_secret else {
        tracing::error!("JWT secret not configured; rejecting authenticated route");
        return Err(ApiError::Auth);
    };

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Auth)?;

    let claims = validate_token(token, secret).map_err(|err| {
        tracing::debug!(error = %err, "Identity token rejected");
        ApiError::Auth
    })?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(request).await)
}
