//! Account Ledger
//!
//! Owns username → (display-name mirror, bank name, wallet, updated_at).
//! Records are created lazily on first read or profile update; deposits never
//! create one. Every mutation is a single atomic store operation.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use walletsync_auth::Principal;
use walletsync_db::{AccountRecord, AccountStore};

use crate::directory::IdentityDirectory;
use crate::error::{LedgerError, LedgerResult};
use crate::resolver::IdentityResolver;
use crate::sync::ProfileSyncPropagator;

#[derive(Clone)]
pub struct AccountLedger {
    accounts: Arc<dyn AccountStore>,
    resolver: IdentityResolver,
    propagator: Arc<ProfileSyncPropagator>,
}

impl AccountLedger {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        directory: Arc<dyn IdentityDirectory>,
        propagator: Arc<ProfileSyncPropagator>,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(directory, accounts.clone()),
            accounts,
            propagator,
        }
    }

    pub fn propagator(&self) -> &Arc<ProfileSyncPropagator> {
        &self.propagator
    }

    /// Read the caller's account, materializing it from the identity service
    /// when absent.
    pub async fn get_account(&self, caller: &Principal, username: &str) -> LedgerResult<AccountRecord> {
        authorize(caller, username)?;

        if let Some(account) = self.accounts.find(username).await? {
            return Ok(account);
        }

        self.resolver
            .resolve(caller, username)
            .await
            .map_err(|e| match e {
                LedgerError::IdentityUnavailable(_) => LedgerError::NotFound(username.to_string()),
                other => other,
            })
    }

    /// Set display name and bank name, creating the record when absent.
    ///
    /// The display name is pushed to the identity store in the background;
    /// the returned record does not depend on that outcome.
    pub async fn update_profile(
        &self,
        caller: &Principal,
        username: &str,
        display_name: &str,
        bank_name: &str,
    ) -> LedgerResult<AccountRecord> {
        authorize(caller, username)?;
        if display_name.trim().is_empty() {
            return Err(LedgerError::InvalidInput("name is required".to_string()));
        }

        let account = self
            .accounts
            .upsert_profile(username, display_name, bank_name, Utc::now())
            .await?;
        info!(username = %username, "Account profile updated");

        self.propagator.propagate(username, display_name);
        Ok(account)
    }

    /// Add `amount` to the wallet of an existing account
    pub async fn deposit(&self, caller: &Principal, username: &str, amount: f64) -> LedgerResult<AccountRecord> {
        authorize(caller, username)?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(
                "amount must be a positive number".to_string(),
            ));
        }

        let account = self
            .accounts
            .increment_wallet(username, amount, Utc::now())
            .await?
            .ok_or(LedgerError::AccountMissing)?;

        info!(username = %username, amount, wallet = account.wallet, "Deposit applied");
        Ok(account)
    }
}

fn authorize(caller: &Principal, username: &str) -> LedgerResult<()> {
    if caller.owns(username) {
        Ok(())
    } else {
        Err(LedgerError::Forbidden)
    }
}
