//! Storage capability traits
//!
//! Both services talk to storage only through these traits. Every method maps
//! to a single atomic per-document operation on the backend; callers never
//! read-modify-write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DbResult;
use crate::models::{AccountRecord, IdentityRecord, ProfileChanges, ProfileRecord};

/// Identity collection keyed by username
#[async_trait]
pub trait IdentityStore: Send + Sync + 'static {
    /// Insert unless a record with the same username exists.
    ///
    /// Returns `false` when the username was already taken.
    async fn insert_if_absent(&self, record: IdentityRecord) -> DbResult<bool>;

    async fn find(&self, username: &str) -> DbResult<Option<IdentityRecord>>;

    /// Set the display name. Returns whether a record matched.
    async fn set_display_name(&self, username: &str, display_name: &str) -> DbResult<bool>;
}

/// Account collection keyed by username
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    async fn find(&self, username: &str) -> DbResult<Option<AccountRecord>>;

    /// Insert unless a record exists; returns whichever record is stored afterwards.
    async fn insert_if_absent(&self, record: AccountRecord) -> DbResult<AccountRecord>;

    /// Set display name, bank name and `updated_at`, creating the record with a
    /// zero wallet when absent.
    async fn upsert_profile(
        &self,
        username: &str,
        display_name: &str,
        bank_name: &str,
        now: DateTime<Utc>,
    ) -> DbResult<AccountRecord>;

    /// Atomically add `amount` to the wallet. `None` when no record exists.
    async fn increment_wallet(
        &self,
        username: &str,
        amount: f64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<AccountRecord>>;
}

/// Profile collection keyed by username
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    /// Returns `false` when a profile already exists for the username.
    async fn insert_if_absent(&self, record: ProfileRecord) -> DbResult<bool>;

    async fn find(&self, username: &str) -> DbResult<Option<ProfileRecord>>;

    /// Apply the fields present in `changes`. Never creates a profile;
    /// `None` when no record exists.
    async fn update(
        &self,
        username: &str,
        changes: &ProfileChanges,
        now: DateTime<Utc>,
    ) -> DbResult<Option<ProfileRecord>>;
}
