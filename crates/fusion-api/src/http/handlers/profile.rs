//! Profile endpoint backing the dashboard.
//!
//! GET /api/v1/me

use std::time::Instant;

use axum::extract::State;
use serde::Serialize;
use uuid::Uuid;

use fusion_core::profile::ProfileRepository;
use fusion_core::quota::QuotaPolicy;
use fusion_types::error::{ActionError, RepositoryError};
use fusion_types::profile::{Tier, UserId};
use fusion_types::quota::{MeteredAction, Remaining};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// The entitlement view a signed-in user sees on their dashboard.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: UserId,
    pub tier: Tier,
    pub daily_message_count: u32,
    pub image_generation_count: u32,
    pub remaining_messages: Remaining,
    pub remaining_images: Remaining,
}

/// GET /api/v1/me -- current profile and remaining allowances.
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<MeResponse>, AppError> {
    let started = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let profile = state
        .profiles
        .get(&user)
        .await
        .map_err(|e| AppError::Action(ActionError::ProfileLoad(e)))?
        .ok_or(AppError::Action(ActionError::ProfileLoad(
            RepositoryError::NotFound,
        )))?;

    let response = MeResponse {
        user_id: profile.user_id,
        tier: profile.tier,
        daily_message_count: profile.daily_message_count,
        image_generation_count: profile.image_generation_count,
        remaining_messages: QuotaPolicy::remaining_at(
            profile.tier,
            MeteredAction::SendMessage,
            profile.daily_message_count,
        ),
        remaining_images: QuotaPolicy::remaining_at(
            profile.tier,
            MeteredAction::GenerateImage,
            profile.image_generation_count,
        ),
    };

    let mut envelope = ApiResponse::success(
        response,
        request_id,
        started.elapsed().as_millis() as u64,
    );
    // Free users get the upgrade pointer alongside their usage numbers.
    if profile.tier == Tier::Free {
        envelope = envelope.with_link("upgrade", "/subscription");
    }
    Ok(envelope)
}
