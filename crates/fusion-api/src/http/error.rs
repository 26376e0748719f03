//! Application error type mapping to HTTP status codes and envelope format.
//!
//! Expected, user-actionable outcomes (unauthenticated, quota exceeded)
//! map to 401/429; unexpected-but-recoverable failures map to 503
//! (profile store) and 502 (upstream) so clients can re-trigger manually.
//! Quota denials carry an `upgrade` link.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use fusion_types::error::ActionError;

/// Where a quota-denied client is sent to upgrade.
const UPGRADE_PATH: &str = "/subscription";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Failure exit from an orchestrated action.
    Action(ActionError),
    /// Authentication failure outside orchestration (extractors).
    Unauthorized(String),
    /// Unknown resource.
    NotFound(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ActionError> for AppError {
    fn from(e: ActionError) -> Self {
        AppError::Action(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::Action(ActionError::Unauthenticated) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "No active session. Sign in to continue.".to_string(),
                None,
            ),
            AppError::Action(ActionError::QuotaExceeded { action, remaining }) => (
                StatusCode::TOO_MANY_REQUESTS,
                "QUOTA_EXCEEDED",
                format!("Quota exceeded for {action}. Upgrade to Pro for unlimited access."),
                Some(json!({
                    "action": action,
                    "remaining": remaining,
                    "reason": "limit_reached",
                })),
            ),
            AppError::Action(ActionError::ProfileLoad(e)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "PROFILE_UNAVAILABLE",
                format!("Profile unavailable: {e}. Try again."),
                None,
            ),
            AppError::Action(ActionError::Upstream(e)) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                format!("AI backend failure: {e}. Try again."),
                None,
            ),
            AppError::Action(ActionError::Commit(e)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMIT_ERROR",
                format!("Usage accounting failure: {e}"),
                None,
            ),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                msg.clone(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
                None,
            ),
        };

        let mut body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
                "details": details,
            }]
        });

        // Quota denials point the client at the upgrade flow.
        if code == "QUOTA_EXCEEDED" {
            body["_links"] = json!({ "upgrade": UPGRADE_PATH });
        }

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
