//! Session token extraction.
//!
//! Tokens arrive as `Authorization: Bearer <token>` or `X-Session-Token`.
//!
//! Two extractors with different strengths:
//! - [`BearerToken`] only parses the header. Orchestrated actions use it
//!   so the orchestrator performs the one authoritative session check.
//! - [`CurrentUser`] resolves the token against the session store, for
//!   non-orchestrated reads (profile, conversation access).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use fusion_core::session::SessionResolver;
use fusion_types::error::SessionError;
use fusion_types::profile::UserId;

use crate::http::error::AppError;
use crate::state::AppState;

/// The raw bearer credential from the request headers.
pub struct BearerToken(pub String);

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        extract_token(parts).map(BearerToken)
    }
}

/// Authenticated identity. Extracting this resolves the session token.
pub struct CurrentUser(pub UserId);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;

        match state.sessions.resolve(&token).await {
            Ok(user_id) => Ok(CurrentUser(user_id)),
            Err(SessionError::Unauthenticated) => Err(AppError::Unauthorized(
                "No active session. Sign in to continue.".to_string(),
            )),
            Err(SessionError::Lookup(msg)) => {
                Err(AppError::Internal(format!("Session lookup failed: {msg}")))
            }
        }
    }
}

/// Extract the session token from request headers.
fn extract_token(parts: &Parts) -> Result<String, AppError> {
    // Try Authorization: Bearer <token>
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    // Try X-Session-Token header
    if let Some(token) = parts.headers.get("x-session-token") {
        let token_str = token.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-Session-Token header encoding".to_string())
        })?;
        return Ok(token_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing session token. Provide via 'Authorization: Bearer <token>' or 'X-Session-Token: <token>' header.".to_string(),
    ))
}
