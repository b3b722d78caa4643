//! Password Service
//!
//! Password hashing using Argon2id (OWASP recommended):
//! - Configurable parameters following OWASP guidelines
//! - Optional pepper for additional security
//! - Constant-time verification via the argon2 verifier

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use zeroize::Zeroizing;

use crate::config::PasswordConfig;
use crate::error::{AuthError, AuthResult};

/// Password service for hashing and verification
#[derive(Clone)]
pub struct PasswordService {
    config: PasswordConfig,
}

impl PasswordService {
    /// Create a new password service
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    /// Hash a password using Argon2id
    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        self.validate_password(password)?;

        let peppered = self.peppered(password);
        let salt = SaltString::generate(&mut OsRng);

        let params = Params::new(
            self.config.memory_cost,
            self.config.time_cost,
            self.config.parallelism,
            Some(self.config.hash_length as usize),
        )
        .map_err(|e| AuthError::Config(format!("Invalid Argon2 params: {}", e)))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let hash = argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::PasswordHashingFailed)?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored digest.
    ///
    /// A digest that cannot be parsed is reported as a mismatch.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let peppered = self.peppered(password);

        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            tracing::warn!("Stored password digest is not a valid PHC string");
            return false;
        };

        // Parameters are read back from the PHC string
        Argon2::default()
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Digest of a random throwaway password under the configured parameters.
    ///
    /// Checking a password against it costs as much as a real check and never
    /// succeeds.
    pub fn decoy_digest(&self) -> AuthResult<String> {
        let throwaway = Zeroizing::new(SaltString::generate(&mut OsRng).as_str().to_string());
        self.hash_password(&throwaway)
    }

    /// Reject empty and oversized passwords
    pub fn validate_password(&self, password: &str) -> AuthResult<()> {
        if password.is_empty() {
            return Err(AuthError::InvalidInput("password must not be empty".to_string()));
        }
        if password.len() > self.config.max_password_length {
            return Err(AuthError::InvalidInput(format!(
                "password must be at most {} characters",
                self.config.max_password_length
            )));
        }
        Ok(())
    }

    fn peppered(&self, password: &str) -> Zeroizing<String> {
        match self.config.pepper {
            Some(ref pepper) => Zeroizing::new(format!("{}{}", password, pepper)),
            None => Zeroizing::new(password.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> PasswordConfig {
    PasswordConfig {
        // Use lower values for tests to be fast
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
        hash_length: 32,
        pepper: None,
        max_password_length: 128,
    }
}
