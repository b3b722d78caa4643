//! API Routes

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use walletsync_auth::AuthLayer;

use crate::handlers;
use crate::state::{AccountState, IdentityState};

/// Identity and profile routes (mounted under `/api/v1`)
pub fn identity_routes(state: &IdentityState) -> Router<Arc<IdentityState>> {
    Router::new()
        // Bearer-protected
        .route("/authinfo/:username", get(handlers::identity::public_info))
        .route(
            "/profile/:username",
            get(handlers::profile::get_profile).put(handlers::profile::update_profile),
        )
        .route_layer(state.auth.layer())
        // Public
        .route("/auth/register", post(handlers::identity::register))
        .route("/auth/login", post(handlers::identity::login))
        // Service credential
        .route("/authinfo/update", put(handlers::identity::update_display_name))
        .route("/profile/internal", post(handlers::profile::create_profile))
}

/// Account service routes (mounted under `/api/v1`)
pub fn account_routes(state: &AccountState) -> Router<Arc<AccountState>> {
    Router::new()
        .route("/account", get(handlers::account::get_account))
        .route("/account/update", put(handlers::account::update_account))
        .route("/account/deposit", post(handlers::account::deposit))
        .route_layer(AuthLayer::new(state.tokens.clone()))
}
