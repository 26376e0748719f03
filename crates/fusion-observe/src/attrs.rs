//! Attribute constants for metering instrumentation.
//!
//! These are string slices usable in `tracing::span!` and
//! `tracing::info_span!` field names, so quota and usage telemetry stays
//! consistent across the codebase.
//!
//! Span naming convention: `"{action} {tier}"` (e.g., `"send_message free"`)

// --- Quota attributes ---

/// The metered action being evaluated (e.g., "send_message").
pub const QUOTA_ACTION: &str = "fusion.quota.action";

/// The tier the decision was made against.
pub const QUOTA_TIER: &str = "fusion.quota.tier";

/// Whether the action was permitted.
pub const QUOTA_ALLOWED: &str = "fusion.quota.allowed";

/// Allowance left after the decision ("unlimited" for pro).
pub const QUOTA_REMAINING: &str = "fusion.quota.remaining";

// --- Usage commit attributes ---

/// The counter the commit targeted (e.g., "daily_messages").
pub const USAGE_COUNTER: &str = "fusion.usage.counter";

/// The counter value after a committed increment.
pub const USAGE_NEW_VALUE: &str = "fusion.usage.new_value";

/// Commit disposition: "committed", "rejected", or "failed".
pub const USAGE_COMMIT_STATUS: &str = "fusion.usage.commit_status";

// --- Action name values ---

/// Chat message send.
pub const ACTION_SEND_MESSAGE: &str = "send_message";

/// Image generation.
pub const ACTION_GENERATE_IMAGE: &str = "generate_image";
