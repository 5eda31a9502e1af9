//! In-memory subscription store for tests

use async_trait::async_trait;
use std::collections::HashMap;
use sub_service_shared::{NewSubscription, Subscription, UpdateDescriptor};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::SubscriptionStore;
use crate::query::AggregateFilter;
use crate::DatabaseError;

/// Map-backed [`SubscriptionStore`] with the same observable behaviour as the
/// PostgreSQL implementation
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    rows: RwLock<HashMap<String, Subscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn create(&self, input: NewSubscription) -> Result<Subscription, DatabaseError> {
        let subscription = input.with_id(Uuid::new_v4().to_string());
        self.rows
            .write()
            .await
            .insert(subscription.id.clone(), subscription.clone());
        Ok(subscription)
    }

    async fn get(&self, id: &str) -> Result<Subscription, DatabaseError> {
        self.rows
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()))
    }

    async fn list(&self, user_id: Option<String>) -> Result<Vec<Subscription>, DatabaseError> {
        let rows = self.rows.read().await;
        let mut subscriptions: Vec<Subscription> = rows
            .values()
            .filter(|row| user_id.as_deref().map_or(true, |user| row.user_id == user))
            .cloned()
            .collect();

        subscriptions.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(subscriptions)
    }

    async fn update(&self, update: UpdateDescriptor) -> Result<Subscription, DatabaseError> {
        let mut rows = self.rows.write().await;
        let subscription = rows
            .get_mut(&update.id)
            .ok_or_else(|| DatabaseError::NotFound(update.id.clone()))?;

        update.apply_to(subscription);
        Ok(subscription.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        self.rows
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()))
    }

    async fn aggregate(&self, filter: AggregateFilter) -> Result<i64, DatabaseError> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|row| filter.matches(row))
            .map(|row| i64::from(row.price))
            .sum())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
