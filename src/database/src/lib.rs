//! Persistence layer for the subscription service
//!
//! Provides the PostgreSQL connection pool, the [`SubscriptionStore`] abstraction
//! with its PostgreSQL implementation, and the SQL builders used for the dynamic
//! update and aggregate statements.

pub mod connections;
pub mod query;
pub mod repositories;

pub use connections::{PostgresConfig, PostgresConnection};
pub use query::{AggregateFilter, AggregateQueryBuilder, BuiltQuery, QueryParam};
pub use repositories::{PostgresSubscriptionStore, SubscriptionStore};

#[cfg(any(test, feature = "testing"))]
pub use repositories::{InMemorySubscriptionStore, MockSubscriptionStore};

/// Common database error types
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Subscription not found: {0}")]
    NotFound(String),
}

impl DatabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }
}
