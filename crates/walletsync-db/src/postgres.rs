//! PostgreSQL document stores
//!
//! Each trait method is a single SQL statement so atomicity comes from the
//! database: uniqueness from the primary key, increments from
//! `wallet = wallet + $n`, partial profile edits from `COALESCE`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::deadline::with_deadline;
use crate::error::{DbError, DbResult};
use crate::models::{AccountRecord, IdentityRecord, ProfileChanges, ProfileRecord};
use crate::store::{AccountStore, IdentityStore, ProfileStore};

const ACCOUNT_COLUMNS: &str = "username, display_name, bank_name, wallet, updated_at";
const PROFILE_COLUMNS: &str =
    "username, display_name, email, timezone, country, created_at, updated_at";

fn map_account_error(e: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.constraint() == Some("accounts_wallet_check") {
            return DbError::Constraint("wallet must stay non-negative".to_string());
        }
    }
    DbError::Query(e)
}

/// Identity table
pub struct PgIdentityStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn insert_if_absent(&self, record: IdentityRecord) -> DbResult<bool> {
        with_deadline(self.timeout, "identities.insert_if_absent", async {
            let result = sqlx::query(
                r#"
                INSERT INTO identities (username, password_digest, display_name, created_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (username) DO NOTHING
                "#,
            )
            .bind(&record.username)
            .bind(&record.password_digest)
            .bind(&record.display_name)
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;

            Ok(result.rows_affected() == 1)
        })
        .await
    }

    async fn find(&self, username: &str) -> DbResult<Option<IdentityRecord>> {
        with_deadline(self.timeout, "identities.find", async {
            let record = sqlx::query_as::<_, IdentityRecord>(
                r#"
                SELECT username, password_digest, display_name, created_at
                FROM identities
                WHERE username = $1
                "#,
            )
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

            Ok(record)
        })
        .await
    }

    async fn set_display_name(&self, username: &str, display_name: &str) -> DbResult<bool> {
        with_deadline(self.timeout, "identities.set_display_name", async {
            let result = sqlx::query("UPDATE identities SET display_name = $2 WHERE username = $1")
                .bind(username)
                .bind(display_name)
                .execute(&self.pool)
                .await?;

            Ok(result.rows_affected() > 0)
        })
        .await
    }
}

/// Account table
pub struct PgAccountStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgAccountStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find(&self, username: &str) -> DbResult<Option<AccountRecord>> {
        with_deadline(self.timeout, "accounts.find", async {
            let record = sqlx::query_as::<_, AccountRecord>(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1"
            ))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

            Ok(record)
        })
        .await
    }

    async fn insert_if_absent(&self, record: AccountRecord) -> DbResult<AccountRecord> {
        with_deadline(self.timeout, "accounts.insert_if_absent", async {
            let inserted = sqlx::query_as::<_, AccountRecord>(&format!(
                r#"
                INSERT INTO accounts ({ACCOUNT_COLUMNS})
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (username) DO NOTHING
                RETURNING {ACCOUNT_COLUMNS}
                "#
            ))
            .bind(&record.username)
            .bind(&record.display_name)
            .bind(&record.bank_name)
            .bind(record.wallet)
            .bind(record.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_account_error)?;

            if let Some(inserted) = inserted {
                return Ok(inserted);
            }

            // Lost the race: hand back the record that won.
            let existing = sqlx::query_as::<_, AccountRecord>(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1"
            ))
            .bind(&record.username)
            .fetch_one(&self.pool)
            .await?;

            Ok(existing)
        })
        .await
    }

    async fn upsert_profile(
        &self,
        username: &str,
        display_name: &str,
        bank_name: &str,
        now: DateTime<Utc>,
    ) -> DbResult<AccountRecord> {
        with_deadline(self.timeout, "accounts.upsert_profile", async {
            let record = sqlx::query_as::<_, AccountRecord>(&format!(
                r#"
                INSERT INTO accounts ({ACCOUNT_COLUMNS})
                VALUES ($1, $2, $3, 0, $4)
                ON CONFLICT (username) DO UPDATE SET
                    display_name = EXCLUDED.display_name,
                    bank_name = EXCLUDED.bank_name,
                    updated_at = EXCLUDED.updated_at
                RETURNING {ACCOUNT_COLUMNS}
                "#
            ))
            .bind(username)
            .bind(display_name)
            .bind(bank_name)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

            Ok(record)
        })
        .await
    }

    async fn increment_wallet(
        &self,
        username: &str,
        amount: f64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<AccountRecord>> {
        with_deadline(self.timeout, "accounts.increment_wallet", async {
            let record = sqlx::query_as::<_, AccountRecord>(&format!(
                r#"
                UPDATE accounts
                SET wallet = wallet + $2, updated_at = $3
                WHERE username = $1
                RETURNING {ACCOUNT_COLUMNS}
                "#
            ))
            .bind(username)
            .bind(amount)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_account_error)?;

            Ok(record)
        })
        .await
    }
}

/// Profile table
pub struct PgProfileStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgProfileStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn insert_if_absent(&self, record: ProfileRecord) -> DbResult<bool> {
        with_deadline(self.timeout, "profiles.insert_if_absent", async {
            let result = sqlx::query(&format!(
                r#"
                INSERT INTO profiles ({PROFILE_COLUMNS})
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (username) DO NOTHING
                "#
            ))
            .bind(&record.username)
            .bind(&record.display_name)
            .bind(&record.email)
            .bind(&record.timezone)
            .bind(&record.country)
            .bind(record.created_at)
            .bind(record.updated_at)
            .execute(&self.pool)
            .await?;

            Ok(result.rows_affected() == 1)
        })
        .await
    }

    async fn find(&self, username: &str) -> DbResult<Option<ProfileRecord>> {
        with_deadline(self.timeout, "profiles.find", async {
            let record = sqlx::query_as::<_, ProfileRecord>(&format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE username = $1"
            ))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

            Ok(record)
        })
        .await
    }

    async fn update(
        &self,
        username: &str,
        changes: &ProfileChanges,
        now: DateTime<Utc>,
    ) -> DbResult<Option<ProfileRecord>> {
        with_deadline(self.timeout, "profiles.update", async {
            let record = sqlx::query_as::<_, ProfileRecord>(&format!(
                r#"
                UPDATE profiles
                SET display_name = COALESCE($2, display_name),
                    email = COALESCE($3, email),
                    timezone = COALESCE($4, timezone),
                    country = COALESCE($5, country),
                    updated_at = $6
                WHERE username = $1
                RETURNING {PROFILE_COLUMNS}
                "#
            ))
            .bind(username)
            .bind(changes.display_name.as_deref())
            .bind(changes.email.as_deref())
            .bind(changes.timezone.as_deref())
            .bind(changes.country.as_deref())
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

            Ok(record)
        })
        .await
    }
}
