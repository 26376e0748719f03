//! SQLite session store and resolver.
//!
//! Bearer tokens are SHA-256 hashed before storage; the plaintext token is
//! returned exactly once at issue time and never persisted. Resolving a
//! token touches `last_seen_at` best-effort (a failed touch never fails
//! the request).

use fusion_core::session::SessionResolver;
use fusion_types::error::{RepositoryError, SessionError};
use fusion_types::profile::UserId;

use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed session issuing and resolution.
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    /// Create a new session store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Issue a new session token for a user.
    ///
    /// Returns the plaintext token (shown once); only its hash is stored.
    pub async fn issue(&self, user_id: &UserId) -> Result<String, RepositoryError> {
        let token = format!(
            "fsn_{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        );
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(hash_token(&token))
        .bind(user_id.to_string())
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(token)
    }
}

/// Compute the SHA-256 hash of a session token (lowercase hex).
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{digest:x}")
}

impl SessionResolver for SqliteSessionStore {
    async fn resolve(&self, token: &str) -> Result<UserId, SessionError> {
        let row = sqlx::query(
            "SELECT user_id FROM sessions WHERE token_hash = ? AND revoked_at IS NULL",
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| SessionError::Lookup(e.to_string()))?;

        let Some(row) = row else {
            return Err(SessionError::Unauthenticated);
        };

        let user_id: String = row
            .try_get("user_id")
            .map_err(|e| SessionError::Lookup(e.to_string()))?;
        let user_id: UserId = user_id
            .parse()
            .map_err(|e| SessionError::Lookup(format!("invalid user id: {e}")))?;

        // Touch last_seen_at (best effort, don't fail the request)
        let now = Utc::now().to_rfc3339();
        let _ = sqlx::query("UPDATE sessions SET last_seen_at = ? WHERE token_hash = ?")
            .bind(&now)
            .bind(hash_token(token))
            .execute(&self.pool.writer)
            .await;

        Ok(user_id)
    }

    async fn revoke(&self, token: &str) -> Result<(), SessionError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE sessions SET revoked_at = ? WHERE token_hash = ? AND revoked_at IS NULL",
        )
        .bind(&now)
        .bind(hash_token(token))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| SessionError::Lookup(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::profile::SqliteProfileRepository;
    use fusion_core::profile::ProfileRepository;
    use fusion_types::profile::Profile;

    async fn test_store() -> (tempfile::TempDir, SqliteSessionStore, UserId) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = DatabasePool::new(&url).await.unwrap();

        // Sessions reference a profile row (FK enforced).
        let profile = Profile::new(UserId::new());
        SqliteProfileRepository::new(pool.clone())
            .create(&profile)
            .await
            .unwrap();

        (dir, SqliteSessionStore::new(pool), profile.user_id)
    }

    #[tokio::test]
    async fn test_issue_and_resolve() {
        let (_dir, store, user) = test_store().await;
        let token = store.issue(&user).await.unwrap();
        assert!(token.starts_with("fsn_"));

        let resolved = store.resolve(&token).await.unwrap();
        assert_eq!(resolved, user);
    }

    #[tokio::test]
    async fn test_resolve_unknown_token_unauthenticated() {
        let (_dir, store, _user) = test_store().await;
        let err = store.resolve("fsn_nosuchtoken").await.unwrap_err();
        assert!(matches!(err, SessionError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_revoked_token_no_longer_resolves() {
        let (_dir, store, user) = test_store().await;
        let token = store.issue(&user).await.unwrap();

        store.revoke(&token).await.unwrap();
        let err = store.resolve(&token).await.unwrap_err();
        assert!(matches!(err, SessionError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_is_noop() {
        let (_dir, store, _user) = test_store().await;
        store.revoke("fsn_neverissued").await.unwrap();
    }

    #[test]
    fn test_hash_token_is_stable_hex() {
        let a = hash_token("fsn_abc");
        let b = hash_token("fsn_abc");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_token("fsn_abd"));
    }
}
