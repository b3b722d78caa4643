//! Identity Resolver
//!
//! Materializes an account record from the identity service the first time
//! a user's account is read or written without one existing.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use walletsync_auth::Principal;
use walletsync_db::{AccountRecord, AccountStore};

use crate::directory::IdentityDirectory;
use crate::error::{LedgerError, LedgerResult};

#[derive(Clone)]
pub struct IdentityResolver {
    directory: Arc<dyn IdentityDirectory>,
    accounts: Arc<dyn AccountStore>,
}

impl IdentityResolver {
    pub fn new(directory: Arc<dyn IdentityDirectory>, accounts: Arc<dyn AccountStore>) -> Self {
        Self {
            directory,
            accounts,
        }
    }

    /// Create the account for `username` from its identity record.
    ///
    /// Concurrent resolutions for one user all return the single stored record.
    pub async fn resolve(&self, caller: &Principal, username: &str) -> LedgerResult<AccountRecord> {
        let info = self
            .directory
            .public_info(username, caller)
            .await
            .map_err(|e| {
                warn!(username = %username, error = %e, "Identity lookup failed");
                LedgerError::IdentityUnavailable(e.to_string())
            })?;

        if info.username != username {
            warn!(username = %username, returned = %info.username, "Identity service returned another user");
            return Err(LedgerError::IdentityUnavailable(format!(
                "expected {}, got {}",
                username, info.username
            )));
        }

        let opened = AccountRecord::opened(username, &info.display_name, Utc::now());
        let stored = self.accounts.insert_if_absent(opened).await?;
        info!(username = %username, "Account materialized from identity");
        Ok(stored)
    }
}
