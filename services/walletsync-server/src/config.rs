//! Server Configuration
//!
//! Layered: built-in defaults, then an optional config file, then
//! `WALLETSYNC__SECTION__KEY` environment variables. CLI flags are applied
//! on top in `main`.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use walletsync_account::{DirectoryConfig, SyncConfig};
use walletsync_auth::AuthConfig;
use walletsync_db::DatabaseConfig;

/// Which services this process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Credential store and token issuer
    Identity,
    /// Account ledger; reaches identity through the configured directory
    Account,
    /// Both, sharing one store
    #[default]
    Combined,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub role: Role,
    pub server: ServerSettings,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub directory: DirectoryConfig,
    pub sync: SyncConfig,
    pub api: ApiSettings,
    pub logging: LoggingConfig,
}

/// Server binding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Grace period for in-flight work after a shutdown signal
    pub shutdown_timeout_secs: u64,
    /// Run migrations on startup (PostgreSQL only)
    pub run_migrations: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_secs: 10,
            run_migrations: true,
        }
    }
}

impl ServerSettings {
    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {}:{}: {}", self.host, self.port, e))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub enable_tracing: bool,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            enable_tracing: true,
            max_body_size: 64 * 1024,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl ServerConfig {
    /// Load configuration from environment and optional config file
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        builder = builder.add_source(
            config::Environment::with_prefix("WALLETSYNC")
                .separator("__")
                .try_parsing(true),
        );

        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        let mut server_config: ServerConfig = builder.build()?.try_deserialize()?;

        // Flat variables shared with other tooling fill gaps the file left
        let env_auth = AuthConfig::from_env();
        if server_config.auth.jwt.secret.is_empty() {
            server_config.auth.jwt.secret = env_auth.jwt.secret;
        }
        if server_config.auth.service.service_token.is_none() {
            server_config.auth.service.service_token = env_auth.service.service_token;
        }

        Ok(server_config)
    }
}
