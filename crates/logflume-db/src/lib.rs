//! # logflume-db
//!
//! PostgreSQL sink layer for the logflume pipeline.
//!
//! This crate provides:
//! - Connection pool management
//! - Idempotent sink schema creation
//! - Bulk-insert sinks for the two log tables
//!
//! ## Example
//!
//! ```rust,ignore
//! use logflume_core::SystemLogSink;
//! use logflume_db::LogStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = LogStore::connect("postgres://localhost/hiring").await?;
//!     store.ensure_schema().await?;
//!
//!     let written = store.system.insert_batch(records).await?;
//!     println!("Persisted {} rows", written);
//!     Ok(())
//! }
//! ```

pub mod model_operation_logs;
pub mod pool;
pub mod schema;
pub mod system_logs;

// Re-export core types
pub use logflume_core::*;

pub use model_operation_logs::PgModelOperationLogSink;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use system_logs::PgSystemLogSink;

use async_trait::async_trait;
use sqlx::postgres::PgPool;

/// Combined log store context with both sinks.
#[derive(Clone)]
pub struct LogStore {
    /// The underlying connection pool.
    pub pool: PgPool,
    /// Sink for system/request events.
    pub system: PgSystemLogSink,
    /// Sink for AI model usage events.
    pub model_operations: PgModelOperationLogSink,
}

impl LogStore {
    /// Create a new LogStore instance from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            system: PgSystemLogSink::new(pool.clone()),
            model_operations: PgModelOperationLogSink::new(pool.clone()),
            pool,
        }
    }

    /// Connect with default pool configuration and wrap the pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Connect with custom pool configuration and wrap the pool.
    pub async fn connect_with_config(database_url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(database_url, config).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl SchemaBootstrap for LogStore {
    async fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.pool).await
    }
}
