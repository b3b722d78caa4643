//! Identity directory
//!
//! The account side's view of the credential store. Two implementations:
//! [`LocalDirectory`] calls an in-process [`AuthService`], [`HttpDirectory`]
//! calls a remote identity service. Both bound every call with a deadline.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use walletsync_auth::{AuthError, AuthService, Principal, PublicInfo, SERVICE_TOKEN_HEADER};

use crate::config::DirectoryConfig;

pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("identity not found")]
    NotFound,

    #[error("identity service rejected the call ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("identity service unreachable: {0}")]
    Unreachable(String),

    #[error("identity service call timed out")]
    Timeout,

    #[error("unexpected identity service response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync + 'static {
    /// Fetch public info for `username`, acting as `caller`
    async fn public_info(&self, username: &str, caller: &Principal) -> DirectoryResult<PublicInfo>;

    /// Overwrite the identity's display name
    async fn update_display_name(&self, username: &str, display_name: &str) -> DirectoryResult<()>;
}

// =============================================================================
// In-process
// =============================================================================

/// Directory backed by an [`AuthService`] in the same process
#[derive(Clone)]
pub struct LocalDirectory {
    auth: AuthService,
    timeout: Duration,
}

impl LocalDirectory {
    pub fn new(auth: AuthService, timeout: Duration) -> Self {
        Self { auth, timeout }
    }
}

#[async_trait]
impl IdentityDirectory for LocalDirectory {
    async fn public_info(&self, username: &str, caller: &Principal) -> DirectoryResult<PublicInfo> {
        tokio::time::timeout(self.timeout, self.auth.public_info_for(caller, username))
            .await
            .map_err(|_| DirectoryError::Timeout)?
            .map_err(from_auth_error)
    }

    async fn update_display_name(&self, username: &str, display_name: &str) -> DirectoryResult<()> {
        tokio::time::timeout(self.timeout, self.auth.update_display_name(username, display_name))
            .await
            .map_err(|_| DirectoryError::Timeout)?
            .map_err(from_auth_error)
    }
}

fn from_auth_error(err: AuthError) -> DirectoryError {
    match err {
        AuthError::UserNotFound => DirectoryError::NotFound,
        AuthError::Timeout(_) => DirectoryError::Timeout,
        other => DirectoryError::Rejected {
            status: other.status_code(),
            message: other.to_string(),
        },
    }
}

// =============================================================================
// HTTP
// =============================================================================

#[derive(Serialize)]
struct UpdateDisplayNameBody<'a> {
    username: &'a str,
    name: &'a str,
}

/// Directory backed by a remote identity service
#[derive(Clone)]
pub struct HttpDirectory {
    base_url: reqwest::Url,
    client: reqwest::Client,
    service_token: Option<String>,
}

impl HttpDirectory {
    pub fn new(config: &DirectoryConfig) -> DirectoryResult<Self> {
        let base_url = reqwest::Url::parse(&config.base_url)
            .map_err(|e| DirectoryError::Unreachable(format!("invalid base url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DirectoryError::Unreachable(format!(
                "base url cannot carry a path: {}",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DirectoryError::Unreachable(e.to_string()))?;

        Ok(Self {
            base_url,
            client,
            service_token: config.service_token.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> DirectoryResult<reqwest::Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DirectoryError::Unreachable("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl IdentityDirectory for HttpDirectory {
    async fn public_info(&self, username: &str, caller: &Principal) -> DirectoryResult<PublicInfo> {
        let url = self.endpoint(&["api", "v1", "authinfo", username])?;
        debug!(%url, "Fetching public identity info");

        let resp = self
            .client
            .get(url)
            .bearer_auth(caller.bearer_token())
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound);
        }
        if !status.is_success() {
            return Err(DirectoryError::Rejected {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        resp.json::<PublicInfo>()
            .await
            .map_err(|e| DirectoryError::Decode(e.to_string()))
    }

    async fn update_display_name(&self, username: &str, display_name: &str) -> DirectoryResult<()> {
        let url = self.endpoint(&["api", "v1", "authinfo", "update"])?;

        let mut req = self.client.put(url).json(&UpdateDisplayNameBody {
            username,
            name: display_name,
        });
        if let Some(token) = &self.service_token {
            req = req.header(SERVICE_TOKEN_HEADER, token);
        }

        let resp = req.send().await.map_err(transport_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DirectoryError::Rejected {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

fn transport_error(err: reqwest::Error) -> DirectoryError {
    if err.is_timeout() {
        DirectoryError::Timeout
    } else {
        DirectoryError::Unreachable(err.to_string())
    }
}
