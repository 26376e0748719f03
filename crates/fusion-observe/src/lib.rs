//! Observability for Fusion: tracing subscriber setup and the attribute
//! names used to instrument quota decisions and usage commits.

pub mod attrs;
pub mod tracing_setup;
