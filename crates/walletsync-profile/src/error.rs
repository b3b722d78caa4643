//! Profile service error types

use thiserror::Error;
use walletsync_db::DbError;

pub type ProfileResult<T> = Result<T, ProfileError>;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("User profile already exists")]
    AlreadyExists,

    #[error("User profile not found")]
    NotFound,

    #[error("Backend timeout: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl ProfileError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::AlreadyExists => 409,
            Self::Timeout(_) => 504,
            Self::Database(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "PROFILE_NOT_FOUND",
            Self::AlreadyExists => "PROFILE_EXISTS",
            Self::Timeout(_) => "BACKEND_TIMEOUT",
            Self::Database(_) => "INTERNAL_ERROR",
        }
    }

    pub fn client_message(&self) -> String {
        match self {
            Self::Timeout(_) => "Backend timed out".to_string(),
            Self::Database(_) => "An internal error occurred".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<DbError> for ProfileError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Timeout(op) => Self::Timeout(op),
            other => Self::Database(other.to_string()),
        }
    }
}
