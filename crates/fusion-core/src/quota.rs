//! Quota policy engine.
//!
//! Pure decision logic: given an entitlement profile and a requested
//! action, decide whether the action is permitted and how much allowance
//! remains. No side effects, no I/O.
//!
//! Policy table:
//!
//! | action         | tier | limit              |
//! |----------------|------|--------------------|
//! | send_message   | free | 15 / day           |
//! | send_message   | pro  | unlimited          |
//! | generate_image | free | 5 (lifetime)       |
//! | generate_image | pro  | unlimited          |
//!
//! The comparison is strict `<` against the limit: a counter at exactly
//! the limit is denied.

use fusion_types::profile::{Profile, Tier};
use fusion_types::quota::{MeteredAction, QuotaDecision, Remaining};

/// Pure quota decision logic for metered actions.
pub struct QuotaPolicy;

impl QuotaPolicy {
    /// Messages a free-tier user may send per UTC day.
    pub const FREE_DAILY_MESSAGE_LIMIT: u32 = 15;

    /// Images a free-tier user may generate, lifetime.
    pub const FREE_IMAGE_GENERATION_LIMIT: u32 = 5;

    /// The limit a tier is held to for an action; `None` means unlimited.
    pub fn limit(tier: Tier, action: MeteredAction) -> Option<u32> {
        match (tier, action) {
            (Tier::Pro, _) => None,
            (Tier::Free, MeteredAction::SendMessage) => Some(Self::FREE_DAILY_MESSAGE_LIMIT),
            (Tier::Free, MeteredAction::GenerateImage) => {
                Some(Self::FREE_IMAGE_GENERATION_LIMIT)
            }
        }
    }

    /// The counter value an action draws from on this profile.
    pub fn current_count(profile: &Profile, action: MeteredAction) -> u32 {
        match action {
            MeteredAction::SendMessage => profile.daily_message_count,
            MeteredAction::GenerateImage => profile.image_generation_count,
        }
    }

    /// Evaluate whether `action` is permitted for `profile`.
    pub fn evaluate(profile: &Profile, action: MeteredAction) -> QuotaDecision {
        let count = Self::current_count(profile, action);
        match Self::limit(profile.tier, action) {
            None => QuotaDecision::allowed(Remaining::Unlimited),
            Some(limit) if count < limit => {
                QuotaDecision::allowed(Remaining::Limited(limit - count))
            }
            Some(limit) => QuotaDecision::denied(Remaining::Limited(limit.saturating_sub(count))),
        }
    }

    /// Allowance left once the counter holds `count`.
    pub fn remaining_at(tier: Tier, action: MeteredAction, count: u32) -> Remaining {
        match Self::limit(tier, action) {
            None => Remaining::Unlimited,
            Some(limit) => Remaining::Limited(limit.saturating_sub(count)),
        }
    }
}
