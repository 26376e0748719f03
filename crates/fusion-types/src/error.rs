use thiserror::Error;

use crate::quota::{MeteredAction, Remaining};

/// Errors from repository operations (used by trait definitions in fusion-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from session resolution.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no active session")]
    Unauthenticated,

    #[error("session lookup failed: {0}")]
    Lookup(String),
}

/// Errors from the upstream AI collaborators.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("upstream request failed: {0}")]
    Http(String),

    #[error("upstream returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    #[error("upstream request timed out")]
    Timeout,
}

/// Failure exits of an orchestrated action.
///
/// `Unauthenticated` and `QuotaExceeded` are expected, user-actionable
/// outcomes. `ProfileLoad` and `Upstream` are unexpected-but-recoverable;
/// the caller may re-trigger manually, no automatic retry is performed.
/// `Commit` is only surfaced when the upstream call itself never produced
/// a result to return.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("no active session")]
    Unauthenticated,

    #[error("profile unavailable: {0}")]
    ProfileLoad(#[from] RepositoryError),

    #[error("quota exceeded for {action} ({remaining} remaining)")]
    QuotaExceeded {
        action: MeteredAction,
        remaining: Remaining,
    },

    #[error("upstream failure: {0}")]
    Upstream(#[from] BackendError),

    #[error("usage commit failed: {0}")]
    Commit(RepositoryError),
}

impl From<SessionError> for ActionError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Unauthenticated => ActionError::Unauthenticated,
            SessionError::Lookup(msg) => ActionError::ProfileLoad(RepositoryError::Query(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_quota_exceeded_display() {
        let err = ActionError::QuotaExceeded {
            action: MeteredAction::SendMessage,
            remaining: Remaining::Limited(0),
        };
        assert_eq!(
            err.to_string(),
            "quota exceeded for send_message (0 remaining)"
        );
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "upstream returned 500: boom");
    }

    #[test]
    fn test_session_error_maps_to_unauthenticated() {
        let err: ActionError = SessionError::Unauthenticated.into();
        assert!(matches!(err, ActionError::Unauthenticated));
    }
}
