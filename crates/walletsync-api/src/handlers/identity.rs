//! Identity service handlers

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use walletsync_auth::{PublicInfo, RequireAuth};

use crate::dto::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, RegisterResponse,
    UpdateDisplayNameRequest,
};
use crate::error::ApiResult;
use crate::extractors::ApiJson;
use crate::state::IdentityState;

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<IdentityState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    state
        .auth
        .register(&request.username, &request.password, &request.name)
        .await?;
    state.profiles.provision(&request.username, &request.name).await;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            username: request.username,
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<IdentityState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let issued = state.auth.login(&request.username, &request.password).await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        username: issued.username,
        expires_at: issued.expires_at,
    }))
}

/// GET /api/v1/authinfo/:username
pub async fn public_info(
    State(state): State<Arc<IdentityState>>,
    RequireAuth(principal): RequireAuth,
    Path(username): Path<String>,
) -> ApiResult<Json<PublicInfo>> {
    let info = state.auth.public_info_for(&principal, &username).await?;
    Ok(Json(info))
}

/// PUT /api/v1/authinfo/update (service to service)
pub async fn update_display_name(
    State(state): State<Arc<IdentityState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<UpdateDisplayNameRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.authorize_service(&headers)?;
    state
        .auth
        .update_display_name(&request.username, &request.name)
        .await?;

    Ok(Json(MessageResponse::new("Display name updated")))
}
