//! Shared domain types for Fusion.
//!
//! This crate contains the core domain types used across the Fusion platform:
//! Profile, Tier, quota decisions, chat messages, and their associated error
//! types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod ai;
pub mod chat;
pub mod error;
pub mod profile;
pub mod quota;
