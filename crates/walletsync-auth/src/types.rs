//! Core authentication types

use serde::{Deserialize, Serialize};

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (username)
    pub sub: String,
    /// Username the token is bound to
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Freshly minted bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub username: String,
    /// Expiry (Unix timestamp)
    pub expires_at: i64,
}

/// Validated caller identity, passed explicitly to every operation that
/// needs to know who is calling.
#[derive(Clone)]
pub struct Principal {
    pub claims: TokenClaims,
    /// Raw bearer token, kept so downstream calls can act on the caller's behalf
    token: String,
}

impl Principal {
    pub fn new(claims: TokenClaims, token: impl Into<String>) -> Self {
        Self {
            claims,
            token: token.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.claims.username
    }

    pub fn bearer_token(&self) -> &str {
        &self.token
    }

    /// Whether this principal may act on `username`'s records
    pub fn owns(&self, username: &str) -> bool {
        self.claims.username == username
    }
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("username", &self.claims.username)
            .field("exp", &self.claims.exp)
            .finish_non_exhaustive()
    }
}

/// Non-sensitive identity fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInfo {
    pub username: String,
    #[serde(rename = "name")]
    pub display_name: String,
}
