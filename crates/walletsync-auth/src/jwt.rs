//! JWT Token Service
//!
//! Stateless bearer tokens bound to a username:
//! - One symmetric key, injected at construction and never mutated
//! - Exactly one accepted algorithm (algorithm-substitution is rejected)
//! - Fixed lifetime, no revocation list

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::bearer::extract_bearer;
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::types::{IssuedToken, Principal, TokenClaims};

/// JWT service for token issuing and validation
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    lifetime: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    /// Create a new JWT service
    pub fn new(config: &JwtConfig) -> AuthResult<Self> {
        if config.secret.is_empty() {
            return Err(AuthError::Config("JWT secret must be set".to_string()));
        }

        let algorithm = match config.algorithm.as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => {
                return Err(AuthError::Config(format!("Unsupported JWT algorithm: {}", other)));
            }
        };

        let lifetime = Duration::from_std(config.token_lifetime)
            .map_err(|e| AuthError::Config(format!("Invalid token lifetime: {}", e)))?;

        Ok(Self {
            algorithm,
            lifetime,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        })
    }

    /// Issue a token for `username`, valid from now for the configured lifetime
    pub fn issue(&self, username: &str) -> AuthResult<IssuedToken> {
        self.issue_at(username, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, username: &str, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        let expires_at = now + self.lifetime;
        let claims = TokenClaims {
            sub: username.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to encode token: {}", e)))?;

        Ok(IssuedToken {
            token,
            username: username.to_string(),
            expires_at: claims.exp,
        })
    }

    /// Validate a token and return its claims
    pub fn validate(&self, token: &str) -> AuthResult<TokenClaims> {
        if token.trim().is_empty() {
            return Err(AuthError::MalformedToken);
        }

        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)?.claims;

        // jsonwebtoken accepts exp == now; a token is dead from its expiry second on
        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }

        if claims.username.is_empty() || claims.username != claims.sub {
            return Err(AuthError::MalformedToken);
        }

        Ok(claims)
    }

    /// Extract the bearer token from request headers and validate it
    pub fn authenticate(&self, headers: &axum::http::HeaderMap) -> AuthResult<Principal> {
        let token = extract_bearer(headers)?;
        let claims = self.validate(token)?;
        Ok(Principal::new(claims, token))
    }
}
