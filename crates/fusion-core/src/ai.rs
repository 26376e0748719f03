//! Upstream AI backend trait definitions.
//!
//! Both collaborators are opaque single round trips: no streaming, no
//! retries, no cancellation of in-flight calls. Implementations live in
//! fusion-infra (`HttpChatBackend`, `HttpImageBackend`).

use fusion_types::ai::{ChatReply, GeneratedImage};
use fusion_types::chat::ChatMessage;
use fusion_types::error::BackendError;

/// Chat completion backend.
pub trait ChatBackend: Send + Sync {
    /// Send the ordered conversation context and receive one reply.
    fn send(
        &self,
        messages: &[ChatMessage],
    ) -> impl std::future::Future<Output = Result<ChatReply, BackendError>> + Send;
}

/// Image generation backend.
pub trait ImageBackend: Send + Sync {
    /// Generate an image from a prompt, returning a fetchable reference.
    fn generate(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<GeneratedImage, BackendError>> + Send;
}
