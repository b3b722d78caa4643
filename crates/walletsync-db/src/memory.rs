//! In-memory document stores
//!
//! Backed by [`DashMap`]; every operation runs under the shard lock of its key,
//! which gives the same per-document atomicity the PostgreSQL backend gets
//! from single-statement upserts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{DbError, DbResult};
use crate::models::{AccountRecord, IdentityRecord, ProfileChanges, ProfileRecord};
use crate::store::{AccountStore, IdentityStore, ProfileStore};

/// In-memory identity collection
#[derive(Default)]
pub struct MemoryIdentityStore {
    records: DashMap<String, IdentityRecord>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn insert_if_absent(&self, record: IdentityRecord) -> DbResult<bool> {
        match self.records.entry(record.username.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    async fn find(&self, username: &str) -> DbResult<Option<IdentityRecord>> {
        Ok(self.records.get(username).map(|r| r.value().clone()))
    }

    async fn set_display_name(&self, username: &str, display_name: &str) -> DbResult<bool> {
        match self.records.get_mut(username) {
            Some(mut record) => {
                record.display_name = display_name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-memory account collection
#[derive(Default)]
pub struct MemoryAccountStore {
    records: DashMap<String, AccountRecord>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find(&self, username: &str) -> DbResult<Option<AccountRecord>> {
        Ok(self.records.get(username).map(|r| r.value().clone()))
    }

    async fn insert_if_absent(&self, record: AccountRecord) -> DbResult<AccountRecord> {
        let stored = self
            .records
            .entry(record.username.clone())
            .or_insert(record);
        Ok(stored.value().clone())
    }

    async fn upsert_profile(
        &self,
        username: &str,
        display_name: &str,
        bank_name: &str,
        now: DateTime<Utc>,
    ) -> DbResult<AccountRecord> {
        let stored = self
            .records
            .entry(username.to_string())
            .and_modify(|record| {
                record.display_name = display_name.to_string();
                record.bank_name = bank_name.to_string();
                record.updated_at = now;
            })
            .or_insert_with(|| AccountRecord {
                username: username.to_string(),
                display_name: display_name.to_string(),
                bank_name: bank_name.to_string(),
                wallet: 0.0,
                updated_at: now,
            });
        Ok(stored.value().clone())
    }

    async fn increment_wallet(
        &self,
        username: &str,
        amount: f64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<AccountRecord>> {
        let Some(mut record) = self.records.get_mut(username) else {
            return Ok(None);
        };
        let next = record.wallet + amount;
        if !next.is_finite() || next < 0.0 {
            return Err(DbError::Constraint(format!("wallet for {} would become {}", username, next)));
        }
        record.wallet = next;
        record.updated_at = now;
        Ok(Some(record.clone()))
    }
}

/// In-memory profile collection
#[derive(Default)]
pub struct MemoryProfileStore {
    records: DashMap<String, ProfileRecord>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn insert_if_absent(&self, record: ProfileRecord) -> DbResult<bool> {
        match self.records.entry(record.username.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    async fn find(&self, username: &str) -> DbResult<Option<ProfileRecord>> {
        Ok(self.records.get(username).map(|r| r.value().clone()))
    }

    async fn update(
        &self,
        username: &str,
        changes: &ProfileChanges,
        now: DateTime<Utc>,
    ) -> DbResult<Option<ProfileRecord>> {
        Ok(self.records.get_mut(username).map(|mut record| {
            record.apply(changes, now);
            record.clone()
        }))
    }
}
