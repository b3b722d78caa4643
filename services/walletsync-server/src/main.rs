//! walletsync server
//!
//! Runs the identity service, the account service, or both in one process.
//!
//! # Usage
//!
//! ```bash
//! # Both services, in-memory storage
//! JWT_SECRET=... walletsync-server
//!
//! # Split deployment
//! walletsync-server --role identity --port 8081
//! WALLETSYNC__DIRECTORY__MODE=http \
//! WALLETSYNC__DIRECTORY__BASE_URL=http://identity:8081 \
//!   walletsync-server --role account --port 8082
//! ```

mod config;

use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use walletsync_account::{
    AccountLedger, DirectoryMode, HttpDirectory, IdentityDirectory, LocalDirectory,
    ProfileSyncPropagator,
};
use walletsync_api::{
    create_account_router, create_combined_router, create_identity_router, AccountState, ApiConfig,
    IdentityState,
};
use walletsync_auth::{AuthService, TokenService};
use walletsync_db::{Database, StorageBackend};

use crate::config::{Role, ServerConfig};

// =============================================================================
// CLI Arguments
// =============================================================================

/// walletsync server - identity and account services
#[derive(Parser, Debug)]
#[command(name = "walletsync-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "WALLETSYNC_CONFIG")]
    config: Option<String>,

    /// Services to run
    #[arg(long, value_enum, env = "WALLETSYNC_ROLE")]
    role: Option<Role>,

    /// Host to bind to
    #[arg(long, env = "WALLETSYNC_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "WALLETSYNC_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "WALLETSYNC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "WALLETSYNC_LOG_FORMAT")]
    log_format: Option<String>,

    /// PostgreSQL connection URL (selects the PostgreSQL backend)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// JWT secret key
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Enable development mode (relaxed security)
    #[arg(long, env = "WALLETSYNC_DEV_MODE")]
    dev_mode: bool,
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    apply_args(&mut server_config, &args);

    init_logging(&server_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        role = ?server_config.role,
        "Starting walletsync server"
    );

    validate_config(&server_config, args.dev_mode)?;

    let db = init_database(&server_config).await?;
    let api_config = ApiConfig {
        enable_cors: server_config.api.enable_cors,
        cors_origins: server_config.api.cors_origins.clone(),
        enable_tracing: server_config.api.enable_tracing,
        max_body_size: server_config.api.max_body_size,
    };

    let (app, propagator) = match server_config.role {
        Role::Identity => {
            let auth = AuthService::new(db.identities.clone(), server_config.auth.clone())?;
            let state = Arc::new(IdentityState::new(db, auth));
            (create_identity_router(state, &api_config), None)
        }
        Role::Account => {
            let tokens = Arc::new(TokenService::new(&server_config.auth.jwt)?);
            let directory = init_directory(&server_config, &db)?;
            let propagator = Arc::new(ProfileSyncPropagator::spawn(directory.clone(), &server_config.sync));
            let ledger = AccountLedger::new(db.accounts.clone(), directory, propagator.clone());
            let state = Arc::new(AccountState::new(db, ledger, tokens));
            (create_account_router(state, &api_config), Some(propagator))
        }
        Role::Combined => {
            if server_config.directory.mode == DirectoryMode::Http {
                tracing::info!("Combined role uses the in-process identity directory; directory.mode ignored");
            }
            let auth = AuthService::new(db.identities.clone(), server_config.auth.clone())?;
            let directory: Arc<dyn IdentityDirectory> = Arc::new(LocalDirectory::new(
                auth.clone(),
                server_config.directory.request_timeout,
            ));
            let propagator = Arc::new(ProfileSyncPropagator::spawn(directory.clone(), &server_config.sync));
            let ledger = AccountLedger::new(db.accounts.clone(), directory, propagator.clone());

            let identity = Arc::new(IdentityState::new(db.clone(), auth.clone()));
            let account = Arc::new(AccountState::new(db, ledger, auth.tokens.clone()));
            (create_combined_router(identity, account, &api_config), Some(propagator))
        }
    };

    let addr = server_config.server.socket_addr()?;
    tracing::info!(
        host = %server_config.server.host,
        port = %server_config.server.port,
        "Server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(propagator) = propagator {
        let grace = server_config.server.shutdown_timeout();
        if tokio::time::timeout(grace, propagator.shutdown()).await.is_err() {
            tracing::warn!(?grace, "Profile sync did not drain before shutdown timeout");
        }
        let stats = propagator.stats();
        tracing::info!(
            enqueued = stats.enqueued,
            succeeded = stats.succeeded,
            failed = stats.failed,
            dropped = stats.dropped,
            superseded = stats.superseded,
            "Profile sync stopped"
        );
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

fn apply_args(config: &mut ServerConfig, args: &Args) {
    if let Some(role) = args.role {
        config.role = role;
    }
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(db_url) = &args.database_url {
        config.database.backend = StorageBackend::Postgres;
        config.database.postgres_url = db_url.clone();
    }
    if let Some(jwt_secret) = &args.jwt_secret {
        config.auth.jwt.secret = jwt_secret.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &args.log_format {
        config.logging.format = format.clone();
    }
}

/// Initialize tracing/logging
fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .try_init()?;
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .try_init()?;
        }
    }

    Ok(())
}

/// Validate configuration
fn validate_config(config: &ServerConfig, dev_mode: bool) -> anyhow::Result<()> {
    if config.auth.jwt.secret.is_empty() {
        anyhow::bail!("JWT secret must be set. Set JWT_SECRET or auth.jwt.secret.");
    }

    if let Err(errors) = config.auth.validate() {
        if dev_mode {
            for error in &errors {
                tracing::warn!(%error, "Auth configuration below production minimums (dev mode)");
            }
        } else {
            anyhow::bail!("Invalid auth configuration: {}", errors.join("; "));
        }
    }

    let mut errors = Vec::new();
    if config.role == Role::Account {
        if let Err(e) = config.directory.validate() {
            errors.extend(e);
        }
        // A local directory reads identities from this process's own store
        if config.directory.mode == DirectoryMode::Local
            && config.database.backend == StorageBackend::Memory
        {
            errors.push(
                "directory.mode = local needs the PostgreSQL store shared with the identity service; \
                 use directory.mode = http or role = combined"
                    .to_string(),
            );
        }
    }
    if config.role != Role::Identity {
        if let Err(e) = config.sync.validate() {
            errors.extend(e);
        }
    }
    if !errors.is_empty() {
        anyhow::bail!("Invalid configuration: {}", errors.join("; "));
    }

    if config.role != Role::Account && config.auth.service.service_token.is_none() {
        tracing::warn!("No service token configured; PUT /api/v1/authinfo/update accepts any caller");
    }
    if config.role == Role::Account
        && config.directory.mode == DirectoryMode::Http
        && config.directory.service_token.is_none()
    {
        tracing::warn!("No directory service token configured; display-name sync sends no credential");
    }
    if config.database.backend == StorageBackend::Memory && !dev_mode {
        tracing::warn!("In-memory storage selected; all state is lost on restart");
    }

    Ok(())
}

/// Initialize database connection
async fn init_database(config: &ServerConfig) -> anyhow::Result<Database> {
    let db = Database::connect(&config.database).await?;

    if config.server.run_migrations {
        db.migrate().await?;
    }

    let health = db.health_check().await;
    if !health.healthy {
        anyhow::bail!("Database health check failed");
    }
    tracing::info!(backend = ?health.backend, "Database health check passed");

    Ok(db)
}

/// Pick how the account service reaches identity
fn init_directory(config: &ServerConfig, db: &Database) -> anyhow::Result<Arc<dyn IdentityDirectory>> {
    match config.directory.mode {
        DirectoryMode::Http => {
            tracing::info!(base_url = %config.directory.base_url, "Using remote identity service");
            Ok(Arc::new(HttpDirectory::new(&config.directory)?))
        }
        DirectoryMode::Local => {
            // Identity records live in the same store
            let auth = AuthService::new(db.identities.clone(), config.auth.clone())?;
            Ok(Arc::new(LocalDirectory::new(auth, config.directory.request_timeout)))
        }
    }
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
