//! Auth session and chat session endpoints.
//!
//! POST /api/v1/auth/sign-out
//! GET /api/v1/chat/sessions/{id}/messages
//! DELETE /api/v1/chat/sessions/{id}

use std::time::Instant;

use axum::extract::{Path, State};
use serde::Serialize;
use uuid::Uuid;

use fusion_core::session::SessionResolver;
use fusion_types::chat::ChatMessage;
use fusion_types::profile::UserId;

use crate::http::error::AppError;
use crate::http::extractors::auth::{BearerToken, CurrentUser};
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub signed_out: bool,
}

/// POST /api/v1/auth/sign-out -- revoke the bearer session.
pub async fn sign_out(
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<ApiResponse<SignOutResponse>, AppError> {
    let started = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    state
        .sessions
        .revoke(&token.0)
        .await
        .map_err(|e| AppError::Internal(format!("Sign-out failed: {e}")))?;

    Ok(ApiResponse::success(
        SignOutResponse { signed_out: true },
        request_id,
        started.elapsed().as_millis() as u64,
    ))
}

#[derive(Debug, Serialize)]
pub struct SessionMessagesResponse {
    pub session_id: Uuid,
    pub messages: Vec<ChatMessage>,
}

/// GET /api/v1/chat/sessions/{id}/messages -- full ordered log.
pub async fn get_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<SessionMessagesResponse>, AppError> {
    let started = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    require_owner(&state, &id, &user)?;
    let messages = state
        .conversations
        .messages(&id)
        .ok_or_else(|| AppError::NotFound(format!("Unknown chat session {id}")))?;

    Ok(ApiResponse::success(
        SessionMessagesResponse {
            session_id: id,
            messages,
        },
        request_id,
        started.elapsed().as_millis() as u64,
    ))
}

#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub ended: bool,
}

/// DELETE /api/v1/chat/sessions/{id} -- end the session, destroying its
/// conversation state.
pub async fn end_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<EndSessionResponse>, AppError> {
    let started = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    require_owner(&state, &id, &user)?;
    let ended = state.conversations.end(&id);
    state.conversation_owners.remove(&id);

    Ok(ApiResponse::success(
        EndSessionResponse { ended },
        request_id,
        started.elapsed().as_millis() as u64,
    ))
}

fn require_owner(state: &AppState, session_id: &Uuid, user: &UserId) -> Result<(), AppError> {
    let owned = state
        .conversation_owners
        .get(session_id)
        .is_some_and(|owner| *owner == *user);
    if owned {
        Ok(())
    } else {
        Err(AppError::NotFound(format!(
            "Unknown chat session {session_id}"
        )))
    }
}
