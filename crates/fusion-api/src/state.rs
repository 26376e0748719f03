//! Application state wiring all services together.
//!
//! AppState holds the concrete orchestrator and repositories used by both
//! CLI and REST API. The orchestrator is generic over its ports, but
//! AppState pins it to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use secrecy::SecretString;
use uuid::Uuid;

use fusion_core::conversation::ConversationStore;
use fusion_core::orchestrator::ActionOrchestrator;
use fusion_infra::backend::chat::HttpChatBackend;
use fusion_infra::backend::image::HttpImageBackend;
use fusion_infra::config::{load_config, FusionConfig};
use fusion_infra::sqlite::pool::{default_data_dir, DatabasePool};
use fusion_infra::sqlite::profile::SqliteProfileRepository;
use fusion_infra::sqlite::session::SqliteSessionStore;
use fusion_types::profile::UserId;

/// Concrete type alias for the orchestrator pinned to infra implementations.
pub type ConcreteOrchestrator = ActionOrchestrator<
    SqliteSessionStore,
    SqliteProfileRepository,
    HttpChatBackend,
    HttpImageBackend,
>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub profiles: Arc<SqliteProfileRepository>,
    pub sessions: Arc<SqliteSessionStore>,
    pub conversations: Arc<ConversationStore>,
    /// Which user opened each conversation session (API-surface scoping).
    pub conversation_owners: Arc<DashMap<Uuid, UserId>>,
    pub config: FusionConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = PathBuf::from(default_data_dir());

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("fusion.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        // Upstream backends share one resolved key
        let api_key = SecretString::from(config.upstream.resolve_api_key().unwrap_or_default());
        let chat_backend = HttpChatBackend::new(
            config.upstream.base_url.clone(),
            api_key.clone(),
            Duration::from_secs(config.upstream.chat_timeout_secs),
        );
        let image_backend = HttpImageBackend::new(
            config.upstream.base_url.clone(),
            api_key,
            Duration::from_secs(config.upstream.image_timeout_secs),
        );

        let conversations = Arc::new(ConversationStore::with_context_window(
            config.chat.context_window,
        ));

        // The orchestrator owns its own repository instances; the API keeps
        // separate ones for non-orchestrated reads and session management.
        let orchestrator = ActionOrchestrator::new(
            SqliteSessionStore::new(db_pool.clone()),
            SqliteProfileRepository::new(db_pool.clone()),
            chat_backend,
            image_backend,
            conversations.clone(),
        );

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            profiles: Arc::new(SqliteProfileRepository::new(db_pool.clone())),
            sessions: Arc::new(SqliteSessionStore::new(db_pool.clone())),
            conversations,
            conversation_owners: Arc::new(DashMap::new()),
            config,
            data_dir,
            db_pool,
        })
    }
}
