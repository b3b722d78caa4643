//! Authentication configuration
//!
//! Centralized configuration for the token issuer, password hashing and the
//! service-to-service credential.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Password hashing configuration
    pub password: PasswordConfig,
    /// Service-to-service credential
    pub service: ServiceAuthConfig,
}

/// JWT token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Secret key for signing tokens (should be at least 256 bits)
    pub secret: String,
    /// Token lifetime
    #[serde(with = "humantime_serde")]
    pub token_lifetime: Duration,
    /// The single accepted algorithm (HS256, HS384, HS512)
    pub algorithm: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be injected at startup
            token_lifetime: Duration::from_secs(60 * 60),
            algorithm: "HS256".to_string(),
        }
    }
}

/// Password hashing configuration (Argon2id)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// Memory cost in KiB (OWASP recommends 19456 KiB = 19 MiB minimum)
    pub memory_cost: u32,
    /// Time cost (iterations) - OWASP recommends 2 minimum
    pub time_cost: u32,
    /// Parallelism factor
    pub parallelism: u32,
    /// Output hash length in bytes
    pub hash_length: u32,
    /// Pepper (additional secret, optional)
    pub pepper: Option<String>,
    /// Maximum password length (to prevent DoS)
    pub max_password_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 19456, // 19 MiB
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
            pepper: None,
            max_password_length: 128,
        }
    }
}

/// Shared credential gating the display-name update path
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceAuthConfig {
    /// Expected value of the `X-Service-Token` header. `None` leaves the path open.
    pub service_token: Option<String>,
}

impl AuthConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            config.jwt.secret = secret;
        }
        if let Ok(algorithm) = std::env::var("JWT_ALGORITHM") {
            config.jwt.algorithm = algorithm;
        }
        if let Ok(pepper) = std::env::var("PASSWORD_PEPPER") {
            config.password.pepper = Some(pepper);
        }
        if let Ok(token) = std::env::var("SERVICE_TOKEN") {
            if !token.is_empty() {
                config.service.service_token = Some(token);
            }
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.jwt.secret.is_empty() {
            errors.push("JWT secret must be set".to_string());
        } else if self.jwt.secret.len() < 32 {
            errors.push("JWT secret should be at least 256 bits (32 bytes)".to_string());
        }

        if !matches!(self.jwt.algorithm.as_str(), "HS256" | "HS384" | "HS512") {
            errors.push(format!("Unsupported JWT algorithm: {}", self.jwt.algorithm));
        }

        if self.jwt.token_lifetime.is_zero() {
            errors.push("Token lifetime must be greater than zero".to_string());
        }

        if self.password.memory_cost < 19456 {
            errors.push("Argon2 memory cost should be at least 19456 KiB (OWASP recommendation)".to_string());
        }
        if self.password.time_cost < 2 {
            errors.push("Argon2 time cost should be at least 2 (OWASP recommendation)".to_string());
        }

        if let Some(token) = &self.service.service_token {
            if token.len() < 16 {
                errors.push("Service token should be at least 16 bytes".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
