//! Account service handlers
//!
//! The target account is always the caller's own.

use axum::{extract::State, Json};
use std::sync::Arc;
use walletsync_auth::RequireAuth;

use crate::dto::{AccountResponse, DepositRequest, UpdateAccountRequest};
use crate::error::ApiResult;
use crate::extractors::ApiJson;
use crate::state::AccountState;

/// GET /api/v1/account
pub async fn get_account(
    State(state): State<Arc<AccountState>>,
    RequireAuth(principal): RequireAuth,
) -> ApiResult<Json<AccountResponse>> {
    let account = state
        .ledger
        .get_account(&principal, principal.username())
        .await?;
    Ok(Json(account.into()))
}

/// PUT /api/v1/account/update
pub async fn update_account(
    State(state): State<Arc<AccountState>>,
    RequireAuth(principal): RequireAuth,
    ApiJson(request): ApiJson<UpdateAccountRequest>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state
        .ledger
        .update_profile(&principal, principal.username(), &request.name, &request.bank_name)
        .await?;
    Ok(Json(account.into()))
}

/// POST /api/v1/account/deposit
pub async fn deposit(
    State(state): State<Arc<AccountState>>,
    RequireAuth(principal): RequireAuth,
    ApiJson(request): ApiJson<DepositRequest>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state
        .ledger
        .deposit(&principal, principal.username(), request.amount)
        .await?;
    Ok(Json(account.into()))
}
