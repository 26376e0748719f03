//! Chat endpoint.
//!
//! POST /api/v1/chat/messages
//!
//! One user message in, one assistant reply out. The orchestrator runs
//! the full sequence (auth, quota, upstream call, usage commit); this
//! handler only manages the conversation session surface: creating a
//! session when none is given and scoping sessions to their owner.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use fusion_observe::attrs::{ACTION_SEND_MESSAGE, QUOTA_ACTION, QUOTA_REMAINING, USAGE_COMMIT_STATUS};
use fusion_types::chat::ChatMessage;
use fusion_types::quota::{CommitStatus, Remaining};

use crate::http::error::AppError;
use crate::http::extractors::auth::{BearerToken, CurrentUser};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Existing session ID to continue; if absent, a new session is created.
    pub session_id: Option<Uuid>,
    /// The user message to send.
    pub message: String,
}

/// Response payload for the chat endpoint.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub session_id: Uuid,
    pub reply: ChatMessage,
    pub remaining_messages: Remaining,
    pub usage_recorded: bool,
}

/// POST /api/v1/chat/messages -- send one chat message.
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    token: BearerToken,
    Json(body): Json<SendMessageRequest>,
) -> Result<ApiResponse<SendMessageResponse>, AppError> {
    let started = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if body.message.trim().is_empty() {
        return Err(AppError::Validation("Message must not be empty".to_string()));
    }

    let session_id = match body.session_id {
        Some(id) => {
            // A session may only be continued by the user who opened it.
            let owned = state
                .conversation_owners
                .get(&id)
                .is_some_and(|owner| *owner == user);
            if !owned {
                return Err(AppError::NotFound(format!("Unknown chat session {id}")));
            }
            id
        }
        None => {
            let id = state.conversations.open();
            state.conversation_owners.insert(id, user);
            id
        }
    };

    let outcome = state
        .orchestrator
        .send_message(&token.0, session_id, body.message)
        .await?;

    info!(
        { QUOTA_ACTION } = ACTION_SEND_MESSAGE,
        { QUOTA_REMAINING } = %outcome.remaining,
        { USAGE_COMMIT_STATUS } = commit_label(&outcome.commit),
        "chat turn completed"
    );

    let usage_recorded = outcome.commit.is_committed();
    Ok(ApiResponse::success(
        SendMessageResponse {
            session_id,
            reply: outcome.message,
            remaining_messages: outcome.remaining,
            usage_recorded,
        },
        request_id,
        started.elapsed().as_millis() as u64,
    ))
}

pub(crate) fn commit_label(commit: &CommitStatus) -> &'static str {
    match commit {
        CommitStatus::Committed { .. } => "committed",
        CommitStatus::Rejected => "rejected",
        CommitStatus::Failed { .. } => "failed",
    }
}
