//! walletsync profile service
//!
//! Contact and locale details kept next to each identity: display name,
//! email, timezone and country. Profiles are created by a trusted service
//! (normally at registration) and afterwards read and edited only by their
//! owner. Editing never creates a profile.

pub mod error;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use walletsync_auth::Principal;
use walletsync_db::{ProfileChanges, ProfileRecord, ProfileStore};

pub use error::{ProfileError, ProfileResult};

#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Create a profile; unset fields take their defaults.
    pub async fn create(&self, username: &str, details: ProfileChanges) -> ProfileResult<ProfileRecord> {
        if username.trim().is_empty() {
            return Err(ProfileError::InvalidInput("username is required".to_string()));
        }

        let record = ProfileRecord::new(username, details, Utc::now());
        if !self.profiles.insert_if_absent(record.clone()).await? {
            return Err(ProfileError::AlreadyExists);
        }

        info!(username = %username, "Profile created");
        Ok(record)
    }

    /// Best-effort profile for a freshly registered identity.
    pub async fn provision(&self, username: &str, display_name: &str) {
        let details = ProfileChanges {
            display_name: Some(display_name.to_string()),
            ..ProfileChanges::default()
        };
        match self.create(username, details).await {
            Ok(_) => {}
            Err(ProfileError::AlreadyExists) => {
                debug!(username = %username, "Profile already present at registration");
            }
            Err(e) => warn!(username = %username, error = %e, "Profile provisioning failed"),
        }
    }

    pub async fn get(&self, caller: &Principal, username: &str) -> ProfileResult<ProfileRecord> {
        if !caller.owns(username) {
            return Err(ProfileError::Forbidden);
        }
        self.profiles
            .find(username)
            .await?
            .ok_or(ProfileError::NotFound)
    }

    pub async fn update(
        &self,
        caller: &Principal,
        username: &str,
        changes: &ProfileChanges,
    ) -> ProfileResult<ProfileRecord> {
        if !caller.owns(username) {
            return Err(ProfileError::Forbidden);
        }
        if changes.is_empty() {
            return Err(ProfileError::InvalidInput("No valid fields to update".to_string()));
        }

        self.profiles
            .update(username, changes, Utc::now())
            .await?
            .ok_or(ProfileError::NotFound)
    }
}
