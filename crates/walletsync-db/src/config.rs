//! Database configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which storage engine backs the document stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local maps; state is lost on restart
    #[default]
    Memory,
    /// PostgreSQL via sqlx
    Postgres,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Storage engine
    pub backend: StorageBackend,
    /// PostgreSQL connection URL
    pub postgres_url: String,
    /// Maximum PostgreSQL connections
    pub pg_max_connections: u32,
    /// Minimum PostgreSQL connections
    pub pg_min_connections: u32,
    /// Connection acquire timeout in seconds
    pub pg_acquire_timeout_secs: u64,
    /// Deadline applied to every storage operation
    #[serde(with = "humantime_serde")]
    pub operation_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            postgres_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/walletsync".to_string()),
            pg_max_connections: 20,
            pg_min_connections: 1,
            pg_acquire_timeout_secs: 10,
            operation_timeout: Duration::from_secs(5),
        }
    }
}

impl DatabaseConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let backend = match std::env::var("DATABASE_BACKEND").ok().as_deref() {
            Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            _ if std::env::var("DATABASE_URL").is_ok() => StorageBackend::Postgres,
            _ => defaults.backend,
        };

        Self {
            backend,
            pg_max_connections: std::env::var("PG_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.pg_max_connections),
            pg_min_connections: std::env::var("PG_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.pg_min_connections),
            pg_acquire_timeout_secs: std::env::var("PG_ACQUIRE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.pg_acquire_timeout_secs),
            ..defaults
        }
    }

    /// Mask sensitive parts of the PostgreSQL URL for logging
    pub fn postgres_url_masked(&self) -> String {
        mask_url(&self.postgres_url)
    }
}

fn mask_url(url: &str) -> String {
    let (Some(scheme_end), Some(at_pos)) = (url.find("://"), url.rfind('@')) else {
        return url.to_string();
    };
    if at_pos < scheme_end {
        return url.to_string();
    }

    let credentials = &url[scheme_end + 3..at_pos];
    match credentials.find(':') {
        Some(colon) => format!(
            "{}{}:***{}",
            &url[..scheme_end + 3],
            &credentials[..colon],
            &url[at_pos..]
        ),
        None => url.to_string(),
    }
}
