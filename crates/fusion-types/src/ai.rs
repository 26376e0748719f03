//! Upstream AI payloads and orchestrated action outcomes.
//!
//! The upstream collaborators are opaque single-round-trip calls: chat
//! takes the ordered message context and returns one reply; image
//! generation takes a prompt and returns a fetchable URL.

use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::quota::{CommitStatus, Remaining};

/// Response from the chat backend for one user message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
}

/// Reference to a generated image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub image_url: String,
}

/// Result of a successful orchestrated chat turn.
///
/// Carries the assistant reply together with the post-commit allowance
/// and the commit status. A failed commit still yields this outcome --
/// the upstream result is never withheld over accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatOutcome {
    pub message: ChatMessage,
    pub remaining: Remaining,
    pub commit: CommitStatus,
}

/// Result of a successful orchestrated image generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageOutcome {
    pub image: GeneratedImage,
    pub remaining: Remaining,
    pub commit: CommitStatus,
}
