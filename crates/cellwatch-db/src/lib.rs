//! # cellwatch-db
//!
//! Record store implementations for cellwatch duplicate detection.
//!
//! This crate provides:
//! - Connection pool management
//! - `PgRecordStore`, a batch lookup over the `bms_analysis` table
//! - `MemoryRecordStore`, an in-process store for tests and small setups
//!
//! ## Example
//!
//! ```rust,ignore
//! use cellwatch_db::Database;
//!
//! let db = Database::connect("postgres://localhost/cellwatch").await?;
//! db.migrate().await?;
//! let store = std::sync::Arc::new(db.records.clone());
//! ```

pub mod memory;
pub mod pool;
pub mod records;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

pub use cellwatch_core::{Error, Result};
pub use memory::MemoryRecordStore;
pub use pool::{create_pool, create_pool_with_config, database_url_from_env, PoolConfig};
pub use records::PgRecordStore;

/// Database context holding the pool and the record store.
#[derive(Clone)]
pub struct Database {
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub records: PgRecordStore,
}

impl Database {
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            records: PgRecordStore::new(pool.clone()),
            pool,
        }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Connect using `DATABASE_URL`.
    pub async fn connect_from_env() -> Result<Self> {
        Self::connect(&database_url_from_env()?).await
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }
}
