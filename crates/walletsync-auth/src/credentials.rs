//! Credential Store
//!
//! Owns the username → (password digest, display name) mapping and enforces
//! username uniqueness through the store's atomic insert-if-absent.

use std::sync::Arc;

use tracing::{debug, info};
use walletsync_db::{IdentityRecord, IdentityStore};
use zeroize::Zeroizing;

use crate::error::{AuthError, AuthResult};
use crate::password::PasswordService;
use crate::types::PublicInfo;

#[derive(Clone)]
pub struct CredentialStore {
    identities: Arc<dyn IdentityStore>,
    passwords: PasswordService,
    /// Verified against when the username is unknown
    decoy_digest: Arc<str>,
}

impl CredentialStore {
    /// Fails when the password hashing parameters are unusable.
    pub fn new(identities: Arc<dyn IdentityStore>, passwords: PasswordService) -> AuthResult<Self> {
        let decoy_digest = passwords.decoy_digest()?.into();
        Ok(Self {
            identities,
            passwords,
            decoy_digest,
        })
    }

    /// Create a new identity. Exactly one of any set of concurrent
    /// registrations for the same username succeeds.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
    ) -> AuthResult<()> {
        require_non_empty("username", username)?;
        require_non_empty("password", password)?;
        require_non_empty("displayName", display_name)?;
        self.passwords.validate_password(password)?;

        let digest = self.hash_blocking(password).await?;
        let record = IdentityRecord::new(username, digest, display_name);

        if !self.identities.insert_if_absent(record).await? {
            debug!(username = %username, "Registration rejected: username taken");
            return Err(AuthError::UsernameTaken);
        }

        info!(username = %username, "Identity registered");
        Ok(())
    }

    /// Check a username/password pair and return the display name.
    ///
    /// An unknown user and a wrong password produce the same error, and both
    /// pay for one Argon2 verification.
    pub async fn verify(&self, username: &str, password: &str) -> AuthResult<String> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let (digest, display_name) = match self.identities.find(username).await? {
            Some(record) => (record.password_digest, Some(record.display_name)),
            None => (self.decoy_digest.to_string(), None),
        };

        let passwords = self.passwords.clone();
        let password = Zeroizing::new(password.to_string());
        let matches = tokio::task::spawn_blocking(move || passwords.verify_password(&password, &digest))
            .await
            .map_err(|e| AuthError::Internal(format!("password verification task failed: {}", e)))?;

        match display_name {
            Some(display_name) if matches => Ok(display_name),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    /// Set the display name. Succeeds without effect for unknown usernames.
    pub async fn update_display_name(&self, username: &str, display_name: &str) -> AuthResult<()> {
        let matched = self.identities.set_display_name(username, display_name).await?;
        if !matched {
            debug!(username = %username, "Display name update for unknown identity ignored");
        }
        Ok(())
    }

    pub async fn get_public_info(&self, username: &str) -> AuthResult<PublicInfo> {
        let record = self
            .identities
            .find(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(PublicInfo {
            username: record.username,
            display_name: record.display_name,
        })
    }

    async fn hash_blocking(&self, password: &str) -> AuthResult<String> {
        let passwords = self.passwords.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || passwords.hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("password hashing task failed: {}", e)))?
    }
}

fn require_non_empty(field: &str, value: &str) -> AuthResult<()> {
    if value.trim().is_empty() {
        return Err(AuthError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}
