//! Image generation endpoint.
//!
//! POST /api/v1/images

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use fusion_observe::attrs::{
    ACTION_GENERATE_IMAGE, QUOTA_ACTION, QUOTA_REMAINING, USAGE_COMMIT_STATUS,
};
use fusion_types::quota::Remaining;

use super::chat::commit_label;
use crate::http::error::AppError;
use crate::http::extractors::auth::BearerToken;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for the image endpoint.
#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
}

/// Response payload for the image endpoint.
#[derive(Debug, Serialize)]
pub struct GenerateImageResponse {
    pub image_url: String,
    pub remaining_generations: Remaining,
    pub usage_recorded: bool,
}

/// POST /api/v1/images -- generate one image from a prompt.
pub async fn generate_image(
    State(state): State<AppState>,
    token: BearerToken,
    Json(body): Json<GenerateImageRequest>,
) -> Result<ApiResponse<GenerateImageResponse>, AppError> {
    let started = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if body.prompt.trim().is_empty() {
        return Err(AppError::Validation("Prompt must not be empty".to_string()));
    }

    let outcome = state
        .orchestrator
        .generate_image(&token.0, &body.prompt)
        .await?;

    info!(
        { QUOTA_ACTION } = ACTION_GENERATE_IMAGE,
        { QUOTA_REMAINING } = %outcome.remaining,
        { USAGE_COMMIT_STATUS } = commit_label(&outcome.commit),
        "image generated"
    );

    let usage_recorded = outcome.commit.is_committed();
    Ok(ApiResponse::success(
        GenerateImageResponse {
            image_url: outcome.image.image_url,
            remaining_generations: outcome.remaining,
            usage_recorded,
        },
        request_id,
        started.elapsed().as_millis() as u64,
    ))
}
