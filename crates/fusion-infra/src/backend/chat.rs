//! HttpChatBackend -- concrete [`ChatBackend`] over the `ai-chat` function.
//!
//! Sends the bounded conversation context as JSON and returns the single
//! reply. The API key is wrapped in [`secrecy::SecretString`] and is never
//! logged or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use fusion_core::ai::ChatBackend;
use fusion_types::ai::ChatReply;
use fusion_types::chat::ChatMessage;
use fusion_types::error::BackendError;

use super::{api_error, map_transport_error};

/// Path of the chat function relative to the upstream base URL.
const CHAT_FUNCTION_PATH: &str = "/functions/v1/ai-chat";

/// HTTP client for the upstream chat function.
pub struct HttpChatBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl HttpChatBackend {
    /// Create a new chat backend.
    ///
    /// `timeout` bounds the full request; a chat round trip that exceeds
    /// it surfaces as [`BackendError::Timeout`].
    pub fn new(base_url: String, api_key: SecretString, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url,
        }
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), CHAT_FUNCTION_PATH)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatInvokeRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatInvokeResponse {
    response: String,
}

impl ChatBackend for HttpChatBackend {
    async fn send(&self, messages: &[ChatMessage]) -> Result<ChatReply, BackendError> {
        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&ChatInvokeRequest { messages })
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: ChatInvokeResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        Ok(ChatReply {
            content: body.response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_types::chat::MessageRole;

    #[test]
    fn test_request_wire_shape() {
        let messages = vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi"),
        ];
        let json = serde_json::to_string(&ChatInvokeRequest {
            messages: &messages,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"messages":[{"role":"user","content":"hello"},{"role":"assistant","content":"hi"}]}"#
        );
    }

    #[test]
    fn test_response_wire_shape() {
        let body: ChatInvokeResponse =
            serde_json::from_str(r#"{"response":"sure"}"#).unwrap();
        assert_eq!(body.response, "sure");
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let backend = HttpChatBackend::new(
            "http://localhost:54321/".to_string(),
            SecretString::from("key"),
            Duration::from_secs(120),
        );
        assert_eq!(backend.url(), "http://localhost:54321/functions/v1/ai-chat");
    }

    #[test]
    fn test_roles_serialize_lowercase() {
        let msg = ChatMessage {
            role: MessageRole::Assistant,
            content: "x".to_string(),
        };
        assert!(serde_json::to_string(&msg).unwrap().contains("\"assistant\""));
    }
}
