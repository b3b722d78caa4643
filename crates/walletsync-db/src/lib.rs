//! walletsync storage layer
//!
//! Document-style persistence for the collections the system owns:
//!
//! - **identities**: username → password digest + display name (identity service)
//! - **accounts**: username → display-name mirror, bank name, wallet (account service)
//! - **profiles**: username → contact and locale details (profile service)
//!
//! Services depend on the [`IdentityStore`], [`AccountStore`] and
//! [`ProfileStore`] traits only.
//! Two backends implement them: an in-memory one for development and tests,
//! and PostgreSQL for deployments.

pub mod config;
pub mod deadline;
pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

use std::sync::Arc;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub use config::{DatabaseConfig, StorageBackend};
pub use error::{DbError, DbResult};
pub use memory::{MemoryAccountStore, MemoryIdentityStore, MemoryProfileStore};
pub use models::{AccountRecord, IdentityRecord, ProfileChanges, ProfileRecord};
pub use postgres::{PgAccountStore, PgIdentityStore, PgProfileStore};
pub use store::{AccountStore, IdentityStore, ProfileStore};

/// Handles to every collection
#[derive(Clone)]
pub struct Database {
    pub identities: Arc<dyn IdentityStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pg: Option<PgPool>,
}

impl Database {
    /// Connect to the configured backend
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        match config.backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage (state is not persisted)");
                Ok(Self::in_memory())
            }
            StorageBackend::Postgres => {
                info!("Connecting to PostgreSQL: {}", config.postgres_url_masked());

                let pg = PgPoolOptions::new()
                    .max_connections(config.pg_max_connections)
                    .min_connections(config.pg_min_connections)
                    .acquire_timeout(std::time::Duration::from_secs(config.pg_acquire_timeout_secs))
                    .connect(&config.postgres_url)
                    .await
                    .map_err(|e| DbError::Connection(format!("PostgreSQL: {}", e)))?;

                info!("Connected to PostgreSQL");

                Ok(Self {
                    identities: Arc::new(PgIdentityStore::new(pg.clone(), config.operation_timeout)),
                    accounts: Arc::new(PgAccountStore::new(pg.clone(), config.operation_timeout)),
                    profiles: Arc::new(PgProfileStore::new(pg.clone(), config.operation_timeout)),
                    pg: Some(pg),
                })
            }
        }
    }

    /// Fresh in-memory stores
    pub fn in_memory() -> Self {
        Self {
            identities: Arc::new(MemoryIdentityStore::new()),
            accounts: Arc::new(MemoryAccountStore::new()),
            profiles: Arc::new(MemoryProfileStore::new()),
            pg: None,
        }
    }

    /// Run database migrations (no-op for the in-memory backend)
    pub async fn migrate(&self) -> DbResult<()> {
        let Some(pg) = &self.pg else {
            return Ok(());
        };
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(pg)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    /// Health check for the backend
    pub async fn health_check(&self) -> HealthStatus {
        match &self.pg {
            Some(pg) => {
                let postgres = sqlx::query("SELECT 1").fetch_one(pg).await.is_ok();
                HealthStatus {
                    backend: StorageBackend::Postgres,
                    healthy: postgres,
                }
            }
            None => HealthStatus {
                backend: StorageBackend::Memory,
                healthy: true,
            },
        }
    }
}

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub backend: StorageBackend,
    pub healthy: bool,
}
