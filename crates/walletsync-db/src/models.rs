//! Stored records - mapped from the `identities`, `accounts` and `profiles` tables

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Identity
// ============================================================================

/// Identity record owned by the identity service.
///
/// Never serialized: the digest must not leave the store.
#[derive(Clone, FromRow)]
pub struct IdentityRecord {
    pub username: String,
    pub password_digest: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl IdentityRecord {
    pub fn new(username: &str, password_digest: String, display_name: &str) -> Self {
        Self {
            username: username.to_string(),
            password_digest,
            display_name: display_name.to_string(),
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for IdentityRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityRecord")
            .field("username", &self.username)
            .field("password_digest", &"<redacted>")
            .field("display_name", &self.display_name)
            .field("created_at", &self.created_at)
            .finish()
    }
}

// ============================================================================
// Account
// ============================================================================

/// Account record owned by the account service
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AccountRecord {
    pub username: String,
    pub display_name: String,
    pub bank_name: String,
    pub wallet: f64,
    pub updated_at: DateTime<Utc>,
}

impl AccountRecord {
    /// Fresh account with an empty bank name and a zero balance
    pub fn opened(username: &str, display_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            username: username.to_string(),
            display_name: display_name.to_string(),
            bank_name: String::new(),
            wallet: 0.0,
            updated_at: now,
        }
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Contact and locale details owned by the profile service
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub timezone: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRecord {
    pub const DEFAULT_TIMEZONE: &'static str = "UTC";

    /// New profile; the display name falls back to the username
    pub fn new(username: &str, changes: ProfileChanges, now: DateTime<Utc>) -> Self {
        Self {
            username: username.to_string(),
            display_name: changes.display_name.unwrap_or_else(|| username.to_string()),
            email: changes.email.unwrap_or_default(),
            timezone: changes
                .timezone
                .unwrap_or_else(|| Self::DEFAULT_TIMEZONE.to_string()),
            country: changes.country.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the fields present in `changes`
    pub fn apply(&mut self, changes: &ProfileChanges, now: DateTime<Utc>) {
        if let Some(display_name) = &changes.display_name {
            self.display_name = display_name.clone();
        }
        if let Some(email) = &changes.email {
            self.email = email.clone();
        }
        if let Some(timezone) = &changes.timezone {
            self.timezone = timezone.clone();
        }
        if let Some(country) = &changes.country {
            self.country = country.clone();
        }
        self.updated_at = now;
    }
}

/// Partial profile; absent fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileChanges {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.email.is_none()
            && self.timezone.is_none()
            && self.country.is_none()
    }
}
