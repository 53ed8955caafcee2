//! PostgreSQL adapters implementing the persistence ports.

mod files;
mod owners;
mod posts;
mod requests;

use std::fmt;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::error::{PostError, Result};

pub use files::PostgresFileRecords;
pub use owners::PostgresOwners;
pub use posts::PostgresPosts;
pub use requests::PostgresRequests;

/// Connection pool plus one repository per table.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    max_connections: u32,
    pub files: PostgresFileRecords,
    pub owners: PostgresOwners,
    pub requests: PostgresRequests,
    pub posts: PostgresPosts,
}

impl fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresStore")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl PostgresStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await
            .map_err(|e| PostError::Internal(format!("Database connection failed: {e}")))?;

        info!(max_connections, "database pool initialized");
        Ok(Self::from_pool(pool, max_connections))
    }

    pub fn from_pool(pool: PgPool, max_connections: u32) -> Self {
        Self {
            files: PostgresFileRecords::new(pool.clone()),
            owners: PostgresOwners::new(pool.clone()),
            requests: PostgresRequests::new(pool.clone()),
            posts: PostgresPosts::new(pool.clone()),
            pool,
            max_connections,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        crate::MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| PostError::Internal(format!("Migration failed: {e}")))?;
        info!("database migrations applied");
        Ok(())
    }
}
