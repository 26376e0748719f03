//! Global configuration loader for Fusion.
//!
//! Reads `config.toml` from the data directory (`~/.fusion/` in production)
//! and deserializes it into [`FusionConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Upstream AI function settings.
///
/// The API key may also be supplied via the `FUSION_UPSTREAM_KEY`
/// environment variable, which takes priority over the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_chat_timeout_secs")]
    pub chat_timeout_secs: u64,
    #[serde(default = "default_image_timeout_secs")]
    pub image_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            chat_timeout_secs: default_chat_timeout_secs(),
            image_timeout_secs: default_image_timeout_secs(),
        }
    }
}

impl UpstreamConfig {
    /// Resolve the upstream API key: environment first, then the file.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var("FUSION_UPSTREAM_KEY")
            .ok()
            .or_else(|| self.api_key.clone())
    }
}

/// Chat behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Messages included in each upstream request context.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_chat_timeout_secs() -> u64 {
    120
}

fn default_image_timeout_secs() -> u64 {
    300
}

fn default_context_window() -> usize {
    fusion_core::conversation::DEFAULT_CONTEXT_WINDOW
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`FusionConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> FusionConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return FusionConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return FusionConfig::default();
        }
    };

    match toml::from_str::<FusionConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            FusionConfig::default()
        }
    }
}
