//! In-memory conversation state.
//!
//! A `Conversation` is an ordered, append-only log of exchanged messages,
//! held only for the lifetime of a chat session. The context sent upstream
//! is a bounded window over the tail of the log; the full in-session log
//! is retained for display.

use dashmap::DashMap;
use uuid::Uuid;

use fusion_types::chat::ChatMessage;

/// Messages included in the upstream request context by default.
pub const DEFAULT_CONTEXT_WINDOW: usize = 32;

/// Ordered, append-only message log for one chat session.
///
/// Messages are never reordered or deleted in place.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    context_window: usize,
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_context_window(DEFAULT_CONTEXT_WINDOW)
    }

    /// Create a conversation with a custom context window size.
    pub fn with_context_window(context_window: usize) -> Self {
        Self {
            messages: Vec::new(),
            context_window: context_window.max(1),
        }
    }

    /// Append a message to the log.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The full ordered log.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The context for the next upstream chat invocation.
    ///
    /// Returns the most recent `context_window` messages in order; older
    /// messages are truncated from the request, not from the log.
    pub fn snapshot_for_request(&self) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(self.context_window);
        &self.messages[start..]
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Session-scoped registry of live conversations.
///
/// Conversations exist only while their chat session is open; ending the
/// session destroys the log. Keyed by session id, so concurrent requests
/// for different sessions never contend.
pub struct ConversationStore {
    conversations: DashMap<Uuid, Conversation>,
    context_window: usize,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::with_context_window(DEFAULT_CONTEXT_WINDOW)
    }

    pub fn with_context_window(context_window: usize) -> Self {
        Self {
            conversations: DashMap::new(),
            context_window,
        }
    }

    /// Open a new conversation, returning its session id.
    pub fn open(&self) -> Uuid {
        let id = Uuid::now_v7();
        self.conversations
            .insert(id, Conversation::with_context_window(self.context_window));
        id
    }

    /// Whether a conversation is live.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.conversations.contains_key(id)
    }

    /// Append a message, creating the conversation if the session is new.
    pub fn append(&self, id: Uuid, message: ChatMessage) {
        self.conversations
            .entry(id)
            .or_insert_with(|| Conversation::with_context_window(self.context_window))
            .append(message);
    }

    /// The bounded upstream context for a session, cloned out so no map
    /// guard is held across an await.
    pub fn snapshot_for_request(&self, id: &Uuid) -> Vec<ChatMessage> {
        self.conversations
            .get(id)
            .map(|c| c.snapshot_for_request().to_vec())
            .unwrap_or_default()
    }

    /// The full ordered log for a session.
    pub fn messages(&self, id: &Uuid) -> Option<Vec<ChatMessage>> {
        self.conversations.get(id).map(|c| c.messages().to_vec())
    }

    /// End a session, destroying its conversation state.
    pub fn end(&self, id: &Uuid) -> bool {
        self.conversations.remove(id).is_some()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
