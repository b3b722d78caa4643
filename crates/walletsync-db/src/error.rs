//! Database error types

use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl DbError {
    /// Whether the failure is a deadline expiry rather than a driver error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
