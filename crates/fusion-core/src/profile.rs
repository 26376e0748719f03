//! ProfileRepository trait definition.
//!
//! The entitlement store port: point reads and conditional counter
//! increments against the per-user profile record. Implementations live
//! in fusion-infra (e.g., `SqliteProfileRepository`). Uses native async
//! fn in traits (RPITIT, Rust 2024 edition).

use fusion_types::error::RepositoryError;
use fusion_types::profile::{Profile, Tier, UserId};
use fusion_types::quota::{IncrementOutcome, UsageCounter};

/// Repository trait for entitlement profile persistence.
pub trait ProfileRepository: Send + Sync {
    /// Create a new profile record.
    fn create(
        &self,
        profile: &Profile,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Point read of a profile by user id.
    fn get(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, RepositoryError>> + Send;

    /// Change a user's tier.
    ///
    /// The request path never calls this; it exists for the billing
    /// collaborator (operator CLI).
    fn set_tier(
        &self,
        user_id: &UserId,
        tier: Tier,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Conditionally increment a usage counter by one.
    ///
    /// The check `current < limit` and the increment execute as a single
    /// atomic statement at the store; `limit = None` increments
    /// unconditionally (unlimited tiers are still counted for
    /// accounting). Returns whether the write committed and the counter
    /// value after the statement.
    fn try_increment(
        &self,
        user_id: &UserId,
        counter: UsageCounter,
        limit: Option<u32>,
    ) -> impl std::future::Future<Output = Result<IncrementOutcome, RepositoryError>> + Send;

    /// Zero every profile's daily message counter.
    ///
    /// Driven by the scheduled daily reset at the UTC day boundary.
    /// Returns the number of profiles reset.
    fn reset_daily_message_counts(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
