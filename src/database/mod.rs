pub mod memory_store;
pub mod rest_store;
pub mod schema;
pub mod schema_repo;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::config::{Config, StorageBackend};
use crate::error::StoreError;
use crate::models::{NewRegistration, RegistrationRow};

pub use memory_store::MemoryStore;
pub use rest_store::RestStore;
pub use schema::{SchemaPlan, REGISTRATIONS_SCHEMA, REGISTRATIONS_TABLE};

/// Storage client seen by the services. Implementations translate their own
/// failures into [`StoreError`].
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Inserts one row and returns it as stored, with `id` and timestamps filled in.
    async fn insert(&self, table: &str, row: &NewRegistration)
        -> Result<RegistrationRow, StoreError>;

    /// Zero-row counting query.
    async fn count(&self, table: &str) -> Result<i64, StoreError>;

    /// Cheapest query that fails with `RelationNotFound` when `table` is absent.
    async fn probe(&self, table: &str) -> Result<(), StoreError>;

    /// Applies a declarative schema plan. Data-only clients keep the default.
    async fn apply_schema(&self, _plan: &SchemaPlan) -> Result<(), StoreError> {
        Err(StoreError::SchemaUnsupported)
    }
}

pub async fn connect(config: &Config) -> Result<Arc<dyn RegistrationStore>, StoreError> {
    match config.storage {
        StorageBackend::Memory => {
            info!("Using in-memory registration storage");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Rest => {
            let mut store = RestStore::new(&config.supabase_url, &config.service_key)?;

            if let Some(url) = config.postgres_url.as_deref() {
                match PgPoolOptions::new().max_connections(1).connect(url).await {
                    Ok(pool) => {
                        info!("Direct database connection available for provisioning");
                        store = store.with_direct_pool(pool);
                    }
                    Err(e) => warn!("POSTGRES_URL set but connection failed: {}", e),
                }
            }

            Ok(Arc::new(store))
        }
    }
}
