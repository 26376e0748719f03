//! HTTP clients for the upstream AI functions.
//!
//! Both collaborators are opaque single round trips over JSON: `ai-chat`
//! takes the ordered message context and returns one reply,
//! `generate-image` takes a prompt and returns a fetchable URL. Fail-fast:
//! one attempt per orchestrated action, errors surfaced to the caller.

pub mod chat;
pub mod image;

use fusion_types::error::BackendError;

/// Map a reqwest transport error to the backend error taxonomy.
fn map_transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Http(e.to_string())
    }
}

/// Convert a non-success upstream response into an API error, consuming
/// the body for the message.
async fn api_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "(unreadable body)".to_string());
    BackendError::Api { status, message }
}
