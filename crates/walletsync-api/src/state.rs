//! Application state shared across handlers

use std::sync::Arc;
use walletsync_account::AccountLedger;
use walletsync_auth::{AuthService, TokenService};
use walletsync_db::Database;
use walletsync_profile::ProfileService;

/// Identity service state; profiles live beside the identities
#[derive(Clone)]
pub struct IdentityState {
    pub db: Database,
    pub auth: AuthService,
    pub profiles: ProfileService,
}

impl IdentityState {
    pub fn new(db: Database, auth: AuthService) -> Self {
        let profiles = ProfileService::new(db.profiles.clone());
        Self { db, auth, profiles }
    }
}

/// Account service state
#[derive(Clone)]
pub struct AccountState {
    pub db: Database,
    pub ledger: AccountLedger,
    /// Validates bearer tokens minted by the identity service (shared key)
    pub tokens: Arc<TokenService>,
}

impl AccountState {
    pub fn new(db: Database, ledger: AccountLedger, tokens: Arc<TokenService>) -> Self {
        Self { db, ledger, tokens }
    }
}

/// Anything that can report backend health
pub trait HealthSource: Send + Sync + 'static {
    fn service_name(&self) -> &'static str;
    fn database(&self) -> &Database;
}

impl HealthSource for IdentityState {
    fn service_name(&self) -> &'static str {
        "identity"
    }

    fn database(&self) -> &Database {
        &self.db
    }
}

impl HealthSource for AccountState {
    fn service_name(&self) -> &'static str {
        "account"
    }

    fn database(&self) -> &Database {
        &self.db
    }
}
