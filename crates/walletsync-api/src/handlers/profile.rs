//! Profile handlers
//!
//! Profile bodies use `display_name`, not `name`.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use walletsync_auth::RequireAuth;
use walletsync_db::{ProfileChanges, ProfileRecord};

use crate::dto::{CreateProfileRequest, MessageResponse};
use crate::error::ApiResult;
use crate::extractors::ApiJson;
use crate::state::IdentityState;

/// POST /api/v1/profile/internal (service to service)
pub async fn create_profile(
    State(state): State<Arc<IdentityState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CreateProfileRequest>,
) -> ApiResult<(StatusCode, Json<ProfileRecord>)> {
    state.auth.authorize_service(&headers)?;
    let profile = state
        .profiles
        .create(&request.username, request.details)
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /api/v1/profile/:username
pub async fn get_profile(
    State(state): State<Arc<IdentityState>>,
    RequireAuth(principal): RequireAuth,
    Path(username): Path<String>,
) -> ApiResult<Json<ProfileRecord>> {
    let profile = state.profiles.get(&principal, &username).await?;
    Ok(Json(profile))
}

/// PUT /api/v1/profile/:username
pub async fn update_profile(
    State(state): State<Arc<IdentityState>>,
    RequireAuth(principal): RequireAuth,
    Path(username): Path<String>,
    ApiJson(changes): ApiJson<ProfileChanges>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .profiles
        .update(&principal, &username, &changes)
        .await?;
    Ok(Json(MessageResponse::new("Profile updated successfully")))
}
