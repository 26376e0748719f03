//! Entitlement profile types for Fusion.
//!
//! A `Profile` is the per-user entitlement record: subscription tier plus
//! the two metered usage counters. Counters are only ever incremented by
//! the request orchestrator after a confirmed successful upstream action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Opaque user identity, obtained once per session.
///
/// Immutable for the session lifetime; referenced (never owned) by every
/// component downstream of session resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a fresh user id (UUID v7, time-sortable).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Subscription tier controlling quota limits.
///
/// Set at account creation / upgrade; mutated only by the billing
/// collaborator (surfaced here via the operator CLI), read-only to the
/// request path. Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (tier IN ('free', 'pro'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Pro => write!(f, "pro"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            other => Err(format!("invalid tier: '{other}'")),
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Free
    }
}

/// Per-user entitlement record.
///
/// `daily_message_count` is reset at the UTC day boundary by the daily
/// reset job. `image_generation_count` is a lifetime counter with no
/// reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub daily_message_count: u32,
    #[serde(default)]
    pub image_generation_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create a fresh profile on the free tier with zeroed counters.
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            tier: Tier::default(),
            daily_message_count: 0,
            image_generation_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_roundtrip() {
        for tier in [Tier::Free, Tier::Pro] {
            let s = tier.to_string();
            let parsed: Tier = s.parse().unwrap();
            assert_eq!(tier, parsed);
        }
    }

    #[test]
    fn test_tier_serde() {
        let json = serde_json::to_string(&Tier::Pro).unwrap();
        assert_eq!(json, "\"pro\"");
        let parsed: Tier = serde_json::from_str("\"free\"").unwrap();
        assert_eq!(parsed, Tier::Free);
    }

    #[test]
    fn test_tier_defaults_to_free() {
        assert_eq!(Tier::default(), Tier::Free);
    }

    #[test]
    fn test_profile_missing_fields_default() {
        // A profile record with absent tier/counters deserializes to the
        // free tier with zeroed counters rather than failing.
        let json = r#"{
            "user_id": "0191e7a0-0000-7000-8000-000000000000",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.tier, Tier::Free);
        assert_eq!(profile.daily_message_count, 0);
        assert_eq!(profile.image_generation_count, 0);
    }

    #[test]
    fn test_new_profile_zeroed() {
        let profile = Profile::new(UserId::new());
        assert_eq!(profile.tier, Tier::Free);
        assert_eq!(profile.daily_message_count, 0);
        assert_eq!(profile.image_generation_count, 0);
    }

    #[test]
    fn test_user_id_display_roundtrip() {
        let id = UserId::new();
        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
