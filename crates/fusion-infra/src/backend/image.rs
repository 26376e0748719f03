//! HttpImageBackend -- concrete [`ImageBackend`] over the `generate-image`
//! function.
//!
//! Sends the prompt as JSON and returns a fetchable image URL.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use fusion_core::ai::ImageBackend;
use fusion_types::ai::GeneratedImage;
use fusion_types::error::BackendError;

use super::{api_error, map_transport_error};

/// Path of the image function relative to the upstream base URL.
const IMAGE_FUNCTION_PATH: &str = "/functions/v1/generate-image";

/// HTTP client for the upstream image generation function.
pub struct HttpImageBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl HttpImageBackend {
    /// Create a new image backend.
    ///
    /// Image generation is slow; callers should pass a generous timeout
    /// (minutes, not seconds).
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
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            IMAGE_FUNCTION_PATH
        )
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ImageInvokeRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct ImageInvokeResponse {
    #[serde(rename = "imageUrl")]
    image_url: String,
}

impl ImageBackend for HttpImageBackend {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, BackendError> {
        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&ImageInvokeRequest { prompt })
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: ImageInvokeResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        Ok(GeneratedImage {
            image_url: body.image_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::to_string(&ImageInvokeRequest {
            prompt: "a neon cityscape",
        })
        .unwrap();
        assert_eq!(json, r#"{"prompt":"a neon cityscape"}"#);
    }

    #[test]
    fn test_response_wire_shape_camel_case() {
        let body: ImageInvokeResponse =
            serde_json::from_str(r#"{"imageUrl":"https://img.example/x.png"}"#).unwrap();
        assert_eq!(body.image_url, "https://img.example/x.png");
    }

    #[test]
    fn test_url_joins() {
        let backend = HttpImageBackend::new(
            "http://localhost:54321".to_string(),
            SecretString::from("key"),
            Duration::from_secs(300),
        );
        assert_eq!(
            backend.url(),
            "http://localhost:54321/functions/v1/generate-image"
        );
    }
}
