//! Request and response bodies
//!
//! Display names travel as `name` on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use walletsync_db::{AccountRecord, ProfileChanges};

// =============================================================================
// Identity service
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    /// Unix timestamp
    pub expires_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDisplayNameRequest {
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Profiles
// =============================================================================

/// Service-to-service profile creation; unset details take their defaults
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProfileRequest {
    pub username: String,
    #[serde(flatten)]
    pub details: ProfileChanges,
}

// =============================================================================
// Account service
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: String,
    #[serde(default)]
    pub bank_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepositRequest {
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub username: String,
    pub name: String,
    pub bank_name: String,
    pub wallet: f64,
    pub updated_at: DateTime<Utc>,
}

impl From<AccountRecord> for AccountResponse {
    fn from(record: AccountRecord) -> Self {
        Self {
            username: record.username,
            name: record.display_name,
            bank_name: record.bank_name,
            wallet: record.wallet,
            updated_at: record.updated_at,
        }
    }
}
