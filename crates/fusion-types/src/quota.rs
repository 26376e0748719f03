//! Quota decision and usage accounting types for Fusion.
//!
//! These types model the outputs of the quota policy engine and the
//! usage-commit step: what was requested, whether it is permitted, how
//! much allowance remains, and whether the post-action commit landed.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use std::fmt;
use std::str::FromStr;

/// An AI-consuming action subject to quota enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeteredAction {
    SendMessage,
    GenerateImage,
}

impl fmt::Display for MeteredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeteredAction::SendMessage => write!(f, "send_message"),
            MeteredAction::GenerateImage => write!(f, "generate_image"),
        }
    }
}

impl FromStr for MeteredAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "send_message" => Ok(MeteredAction::SendMessage),
            "generate_image" => Ok(MeteredAction::GenerateImage),
            other => Err(format!("invalid metered action: '{other}'")),
        }
    }
}

/// The stored counter a metered action draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageCounter {
    /// Messages sent today; zeroed at the UTC day boundary.
    DailyMessages,
    /// Lifetime image generations; never reset.
    ImageGenerations,
}

impl UsageCounter {
    /// The counter consumed by a metered action.
    pub fn for_action(action: MeteredAction) -> Self {
        match action {
            MeteredAction::SendMessage => UsageCounter::DailyMessages,
            MeteredAction::GenerateImage => UsageCounter::ImageGenerations,
        }
    }
}

impl fmt::Display for UsageCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageCounter::DailyMessages => write!(f, "daily_messages"),
            UsageCounter::ImageGenerations => write!(f, "image_generations"),
        }
    }
}

/// Allowance left for an action after the current counter value.
///
/// Serializes as a plain number for limited tiers and as the string
/// sentinel `"unlimited"` for pro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Limited(u32),
    Unlimited,
}

impl Remaining {
    /// Whether the allowance is used up (always false for unlimited).
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Remaining::Limited(0))
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remaining::Limited(n) => write!(f, "{n}"),
            Remaining::Unlimited => write!(f, "unlimited"),
        }
    }
}

impl Serialize for Remaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Remaining::Limited(n) => serializer.serialize_u32(*n),
            Remaining::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for Remaining {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RemainingVisitor;

        impl<'de> Visitor<'de> for RemainingVisitor {
            type Value = Remaining;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or the string \"unlimited\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Remaining, E> {
                u32::try_from(v)
                    .map(Remaining::Limited)
                    .map_err(|_| E::custom(format!("remaining out of range: {v}")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Remaining, E> {
                u32::try_from(v)
                    .map(Remaining::Limited)
                    .map_err(|_| E::custom(format!("remaining out of range: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Remaining, E> {
                if v == "unlimited" {
                    Ok(Remaining::Unlimited)
                } else {
                    Err(E::custom(format!("invalid remaining sentinel: '{v}'")))
                }
            }
        }

        deserializer.deserialize_any(RemainingVisitor)
    }
}

/// Why a quota decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaReason {
    Ok,
    LimitReached,
    Unauthenticated,
}

/// Transient verdict of the quota policy engine. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub remaining: Remaining,
    pub reason: QuotaReason,
}

impl QuotaDecision {
    pub fn allowed(remaining: Remaining) -> Self {
        Self {
            allowed: true,
            remaining,
            reason: QuotaReason::Ok,
        }
    }

    pub fn denied(remaining: Remaining) -> Self {
        Self {
            allowed: false,
            remaining,
            reason: QuotaReason::LimitReached,
        }
    }
}

/// Result of a conditional counter increment at the store.
///
/// `committed` is false when the guard (`current < limit`) no longer held
/// at write time; `new_value` is the counter value after the statement
/// either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementOutcome {
    pub committed: bool,
    pub new_value: u32,
}

/// Whether the post-action usage commit landed.
///
/// A failed commit never hides the upstream result from the caller; it is
/// carried here so accounting drift stays observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CommitStatus {
    Committed { new_value: u32 },
    /// The store-level guard rejected the increment (counter already at
    /// its limit when the write ran).
    Rejected,
    Failed { reason: String },
}

impl CommitStatus {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitStatus::Committed { .. })
    }
}
