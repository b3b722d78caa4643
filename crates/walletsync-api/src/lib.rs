//! walletsync REST API
//!
//! Thin HTTP adapters over the identity, profile and account cores.
//!
//! # API Structure
//!
//! ```text
//! Identity service
//!   POST /api/v1/auth/register        - create identity (201)
//!   POST /api/v1/auth/login           - mint bearer token
//!   GET  /api/v1/authinfo/:username   - public info (bearer, own user only)
//!   PUT  /api/v1/authinfo/update      - display name (X-Service-Token)
//!   POST /api/v1/profile/internal     - create profile (X-Service-Token, 201)
//!   GET  /api/v1/profile/:username    - profile (bearer, own user only)
//!   PUT  /api/v1/profile/:username    - edit profile fields (bearer, own user only)
//!
//! Account service (bearer)
//!   GET  /api/v1/account              - read, created on first access
//!   PUT  /api/v1/account/update       - display name + bank name
//!   POST /api/v1/account/deposit      - add to wallet
//!
//! Both
//!   GET  /health
//! ```

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderName;
use axum::Router;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use state::{AccountState, HealthSource, IdentityState};

/// API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Enable CORS for browser clients
    pub enable_cors: bool,
    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
    /// Enable request tracing
    pub enable_tracing: bool,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            enable_tracing: true,
            max_body_size: 64 * 1024,
        }
    }
}

/// Identity service router with all middleware
pub fn create_identity_router(state: Arc<IdentityState>, config: &ApiConfig) -> Router {
    let router = Router::new()
        .nest("/api/v1", routes::identity_routes(&state))
        .route("/health", axum::routing::get(handlers::health::health_check::<IdentityState>))
        .with_state(state);

    apply_layers(router, config)
}

/// Account service router with all middleware
pub fn create_account_router(state: Arc<AccountState>, config: &ApiConfig) -> Router {
    let router = Router::new()
        .nest("/api/v1", routes::account_routes(&state))
        .route("/health", axum::routing::get(handlers::health::health_check::<AccountState>))
        .with_state(state);

    apply_layers(router, config)
}

/// Both services in one router (single-process deployment)
pub fn create_combined_router(
    identity: Arc<IdentityState>,
    account: Arc<AccountState>,
    config: &ApiConfig,
) -> Router {
    let identity_router = Router::new()
        .nest("/api/v1", routes::identity_routes(&identity))
        .route("/health", axum::routing::get(handlers::health::health_check::<IdentityState>))
        .with_state(identity);
    let account_router = Router::new()
        .nest("/api/v1", routes::account_routes(&account))
        .with_state(account);

    apply_layers(identity_router.merge(account_router), config)
}

fn apply_layers(mut router: Router, config: &ApiConfig) -> Router {
    router = router.layer(DefaultBodyLimit::max(config.max_body_size));

    // Add tracing
    if config.enable_tracing {
        router = router.layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");

                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        );
    }

    // Request ID outermost so the trace span can see it
    let x_request_id = HeaderName::from_static("x-request-id");
    router = router
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    // Add CORS
    if config.enable_cors {
        let cors = if config.cors_origins.iter().any(|o| o == "*") {
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(
                    config
                        .cors_origins
                        .iter()
                        .filter_map(|o| o.parse().ok())
                        .collect::<Vec<_>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(Any)
        };
        router = router.layer(cors);
    }

    router
}
