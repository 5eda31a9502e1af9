//! PostgreSQL connection pool lifecycle

use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{DatabaseError, PostgresConfig};

/// PostgreSQL connection manager
pub struct PostgresConnection {
    pool: Arc<PgPool>,
}

impl PostgresConnection {
    /// Build the pool and verify connectivity with `SELECT 1`
    pub async fn new(config: PostgresConfig) -> Result<Self, DatabaseError> {
        config.validate()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(config.max_lifetime_seconds))
            .connect(&config.url)
            .await
            .map_err(DatabaseError::Postgres)?;

        let row = sqlx::query("SELECT 1").fetch_one(&pool).await?;
        let value: i32 = row.try_get(0)?;
        if value != 1 {
            return Err(DatabaseError::Connection(
                "PostgreSQL connection test failed".to_string(),
            ));
        }

        info!(
            max_connections = config.max_connections,
            "PostgreSQL connection pool created successfully"
        );

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Get connection pool
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Close connection pool
    pub async fn close(&self) {
        info!("Closing PostgreSQL connection pool");
        self.pool.close().await;
    }
}
