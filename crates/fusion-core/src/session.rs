//! SessionResolver trait definition.
//!
//! The auth collaborator port: map a bearer credential to the
//! authenticated identity, or signal that no live session exists.
//! One idempotent check per orchestrated action, no retries.

use fusion_types::error::SessionError;
use fusion_types::profile::UserId;

/// Resolves bearer credentials to authenticated identities.
///
/// Implementations live in fusion-infra (e.g., `SqliteSessionStore`).
pub trait SessionResolver: Send + Sync {
    /// Resolve a session token to the user it authenticates.
    ///
    /// Fails with [`SessionError::Unauthenticated`] when no live session
    /// matches; callers must not proceed to quota or AI calls.
    fn resolve(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<UserId, SessionError>> + Send;

    /// Revoke a session token (sign-out).
    fn revoke(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<(), SessionError>> + Send;
}
