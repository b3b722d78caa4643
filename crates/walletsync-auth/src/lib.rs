//! walletsync Authentication Layer
//!
//! The identity side of walletsync:
//!
//! - **Credential Store**: username → (Argon2id digest, display name), unique usernames
//! - **Token Issuer/Validator**: HS256 bearer tokens with a fixed lifetime
//! - **Service credential**: shared secret gating the display-name update path
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      AuthService                         │
//! ├──────────────────────────────────────────────────────────┤
//! │   register / login / public_info_for / update_display    │
//! │            │                           │                 │
//! │            ▼                           ▼                 │
//! │     CredentialStore               TokenService           │
//! │   (PasswordService +          (jsonwebtoken, one key,    │
//! │     IdentityStore)              one algorithm)           │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod bearer;
pub mod config;
pub mod credentials;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod types;

pub use bearer::{extract_bearer, verify_service_token, SERVICE_TOKEN_HEADER};
pub use config::{AuthConfig, JwtConfig, PasswordConfig, ServiceAuthConfig};
pub use credentials::CredentialStore;
pub use error::{AuthError, AuthResult, ErrorResponse};
pub use jwt::TokenService;
pub use middleware::{auth_error_response, AuthLayer, AuthMiddleware, RequireAuth};
pub use password::PasswordService;
pub use types::*;

use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::info;
use walletsync_db::IdentityStore;

/// Identity service operations
#[derive(Clone)]
pub struct AuthService {
    pub credentials: CredentialStore,
    pub tokens: Arc<TokenService>,
    service_token: Option<String>,
}

impl AuthService {
    /// Create the auth service. Fails when the token configuration is unusable.
    pub fn new(identities: Arc<dyn IdentityStore>, config: AuthConfig) -> AuthResult<Self> {
        let tokens = Arc::new(TokenService::new(&config.jwt)?);
        let credentials = CredentialStore::new(identities, PasswordService::new(config.password))?;

        Ok(Self {
            credentials,
            tokens,
            service_token: config.service.service_token,
        })
    }

    pub async fn register(&self, username: &str, password: &str, display_name: &str) -> AuthResult<()> {
        self.credentials.register(username, password, display_name).await
    }

    /// Verify credentials and mint a token
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<IssuedToken> {
        self.credentials.verify(username, password).await?;
        let issued = self.tokens.issue(username)?;
        info!(username = %username, "Login succeeded");
        Ok(issued)
    }

    /// Public identity fields, readable only by their owner
    pub async fn public_info_for(&self, principal: &Principal, username: &str) -> AuthResult<PublicInfo> {
        if !principal.owns(username) {
            return Err(AuthError::Forbidden);
        }
        self.credentials.get_public_info(username).await
    }

    pub async fn update_display_name(&self, username: &str, display_name: &str) -> AuthResult<()> {
        self.credentials.update_display_name(username, display_name).await
    }

    /// Validate the bearer token in `headers`
    pub fn authenticate(&self, headers: &HeaderMap) -> AuthResult<Principal> {
        self.tokens.authenticate(headers)
    }

    /// Check the service-to-service credential in `headers`
    pub fn authorize_service(&self, headers: &HeaderMap) -> AuthResult<()> {
        verify_service_token(headers, self.service_token.as_deref())
    }

    /// Middleware layer attaching the caller's [`Principal`]
    pub fn layer(&self) -> AuthLayer {
        AuthLayer::new(self.tokens.clone())
    }
}
