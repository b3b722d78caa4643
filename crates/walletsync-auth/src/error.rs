//! Authentication error types
//!
//! Errors are designed to be:
//! - Informative for logging
//! - Safe for external exposure (no storage or key detail leaks)
//! - Convertible to HTTP status codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use walletsync_db::DbError;

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    // =========================================================================
    // Validation / Conflict
    // =========================================================================
    /// Missing or malformed input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Username is already registered
    #[error("Username already exists")]
    UsernameTaken,

    // =========================================================================
    // Credential / Token Errors
    // =========================================================================
    /// Unknown user or wrong password; the two are deliberately indistinguishable
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Missing header, wrong scheme, empty or structurally invalid token
    #[error("Missing or invalid token")]
    MalformedToken,

    /// Signature does not match the issuer key
    #[error("Invalid token signature")]
    BadSignature,

    /// Token is at or past its expiry
    #[error("Token has expired")]
    TokenExpired,

    /// Token was signed with an algorithm other than the configured one
    #[error("Unexpected signing algorithm")]
    WrongAlgorithm,

    /// Service-to-service credential missing or wrong
    #[error("Invalid service credential")]
    InvalidServiceCredential,

    // =========================================================================
    // Permission / Lookup
    // =========================================================================
    /// Authenticated, but acting on another principal's data
    #[error("Forbidden")]
    Forbidden,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Password hashing failed
    #[error("Password hashing failed")]
    PasswordHashingFailed,

    /// Storage call exceeded its deadline
    #[error("Backend timeout: {0}")]
    Timeout(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not be exposed to clients)
    #[error("Internal error")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,

            Self::InvalidCredentials
            | Self::MalformedToken
            | Self::BadSignature
            | Self::TokenExpired
            | Self::WrongAlgorithm
            | Self::InvalidServiceCredential => 401,

            Self::Forbidden => 403,
            Self::UserNotFound => 404,
            Self::UsernameTaken => 409,

            Self::Timeout(_) => 504,

            Self::PasswordHashingFailed
            | Self::Database(_)
            | Self::Config(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Get an error code for the client (safe to expose)
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MalformedToken | Self::BadSignature | Self::WrongAlgorithm => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidServiceCredential => "INVALID_SERVICE_CREDENTIAL",
            Self::Forbidden => "FORBIDDEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::Timeout(_) => "BACKEND_TIMEOUT",
            Self::PasswordHashingFailed
            | Self::Database(_)
            | Self::Config(_)
            | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get safe message for client (doesn't leak internal details)
    pub fn client_message(&self) -> String {
        match self {
            Self::MalformedToken | Self::BadSignature | Self::WrongAlgorithm | Self::TokenExpired => {
                "Invalid or expired token".to_string()
            }
            Self::Timeout(_) => "Backend timed out".to_string(),
            Self::PasswordHashingFailed | Self::Database(_) | Self::Internal(_) | Self::Config(_) => {
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error response for API clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (machine-readable)
    pub code: String,
    /// Error message (human-readable)
    pub message: String,
}

impl From<&AuthError> for ErrorResponse {
    fn from(error: &AuthError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.client_message(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::InvalidAlgorithm => Self::WrongAlgorithm,
            _ => Self::MalformedToken,
        }
    }
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Timeout(op) => Self::Timeout(op),
            other => Self::Database(other.to_string()),
        }
    }
}
