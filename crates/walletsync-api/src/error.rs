//! API error handling
//!
//! Every failure leaves the service as `{code, message}` JSON with a coarse
//! status. Storage and upstream detail is logged, never returned.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use walletsync_account::LedgerError;
use walletsync_auth::AuthError;
use walletsync_profile::ProfileError;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Body missing, not JSON, or the wrong shape
    #[error("Invalid request body: {0}")]
    InvalidRequestBody(String),

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        let code = match self {
            Self::Auth(e) => e.status_code(),
            Self::Ledger(e) => e.status_code(),
            Self::InvalidRequestBody(_) => 400,
            Self::Profile(e) => e.status_code(),
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.error_code(),
            Self::Ledger(e) => e.error_code(),
            Self::InvalidRequestBody(_) => "INVALID_REQUEST_BODY",
            Self::Profile(e) => e.error_code(),
        }
    }

    pub fn client_message(&self) -> String {
        match self {
            Self::Auth(e) => e.client_message(),
            Self::Ledger(e) => e.client_message(),
            Self::InvalidRequestBody(_) => "Invalid request body".to_string(),
            Self::Profile(e) => e.client_message(),
        }
    }
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.client_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequestBody(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(AuthError::UsernameTaken).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AuthError::TokenExpired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(LedgerError::AccountMissing).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ProfileError::AlreadyExists).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::InvalidRequestBody("eof".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let err = ApiError::from(LedgerError::Database("connection reset by peer".to_string()));
        let body = ErrorResponse::from(&err);
        assert_eq!(body.code, "INTERNAL_ERROR");
        assert!(!body.message.contains("peer"));
    }
}
