//! Health Check Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::HealthSource;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    pub service: String,
    pub version: String,
    /// Storage backend in use
    pub database: String,
    /// Unix timestamp (ms)
    pub timestamp: i64,
}

/// Returns 200 when storage answers, 503 otherwise
pub async fn health_check<S: HealthSource>(State(state): State<Arc<S>>) -> (StatusCode, Json<HealthResponse>) {
    let db = state.database().health_check().await;
    let status = if db.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if db.healthy { "healthy" } else { "degraded" }.to_string(),
            service: state.service_name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: format!("{:?}", db.backend).to_lowercase(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }),
    )
}
