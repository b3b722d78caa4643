//! Account ledger error types

use thiserror::Error;
use walletsync_db::DbError;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Deposit amount was zero, negative or not a finite number
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Caller's principal does not own the target account
    #[error("Forbidden")]
    Forbidden,

    /// No account record exists (deposit never creates one)
    #[error("Account not found")]
    AccountMissing,

    /// The identity service could not supply the user's public info
    #[error("Identity unavailable: {0}")]
    IdentityUnavailable(String),

    #[error("Account not found for user: {0}")]
    NotFound(String),

    #[error("Backend timeout: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::InvalidAmount(_) => 400,
            Self::Forbidden => 403,
            Self::AccountMissing | Self::NotFound(_) | Self::IdentityUnavailable(_) => 404,
            Self::Timeout(_) => 504,
            Self::Database(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::Forbidden => "FORBIDDEN",
            Self::AccountMissing | Self::NotFound(_) | Self::IdentityUnavailable(_) => {
                "ACCOUNT_NOT_FOUND"
            }
            Self::Timeout(_) => "BACKEND_TIMEOUT",
            Self::Database(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show clients; storage and upstream detail stays in logs
    pub fn client_message(&self) -> String {
        match self {
            Self::AccountMissing | Self::NotFound(_) | Self::IdentityUnavailable(_) => {
                "Account not found".to_string()
            }
            Self::Timeout(_) => "Backend timed out".to_string(),
            Self::Database(_) => "An internal error occurred".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Timeout(op) => Self::Timeout(op),
            DbError::Constraint(msg) => Self::InvalidAmount(msg),
            other => Self::Database(other.to_string()),
        }
    }
}
