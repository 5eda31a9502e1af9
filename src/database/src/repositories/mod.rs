//! Repository pattern implementation for subscription storage
//!
//! - [`SubscriptionStore`] defines the data operations used by the HTTP layer
//! - [`PostgresSubscriptionStore`] executes them against PostgreSQL
//! - `InMemorySubscriptionStore` and `MockSubscriptionStore` back tests
//!   (enabled with the `testing` feature)

pub mod subscriptions;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

use async_trait::async_trait;
use sub_service_shared::{NewSubscription, Subscription, UpdateDescriptor};

use super::query::AggregateFilter;
use super::DatabaseError;

pub use subscriptions::PostgresSubscriptionStore;

#[cfg(any(test, feature = "testing"))]
pub use memory::InMemorySubscriptionStore;

/// Subscription data operations. Each call is a single backend round trip.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Persist a new subscription under a freshly generated id
    async fn create(&self, input: NewSubscription) -> Result<Subscription, DatabaseError>;

    /// Fetch by id; `NotFound` when no row matches
    async fn get(&self, id: &str) -> Result<Subscription, DatabaseError>;

    /// All subscriptions, newest start month first, optionally for one user
    async fn list(&self, user_id: Option<String>) -> Result<Vec<Subscription>, DatabaseError>;

    /// Apply a partial update and return the resulting record
    ///
    /// Callers skip no-op descriptors ([`UpdateDescriptor::is_noop`]) instead of
    /// passing them here. Given one anyway, implementations write nothing and
    /// return the current record, or `NotFound`.
    async fn update(&self, update: UpdateDescriptor) -> Result<Subscription, DatabaseError>;

    /// Remove by id; `NotFound` when no row matches
    async fn delete(&self, id: &str) -> Result<(), DatabaseError>;

    /// Sum of `price` over the filtered range; 0 when nothing matches
    async fn aggregate(&self, filter: AggregateFilter) -> Result<i64, DatabaseError>;

    /// Connectivity probe used by the health endpoint
    async fn ping(&self) -> Result<(), DatabaseError>;
}
