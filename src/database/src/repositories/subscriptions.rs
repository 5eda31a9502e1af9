//! PostgreSQL subscription repository

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::sync::Arc;
use sub_service_shared::{NewSubscription, Subscription, UpdateDescriptor};
use tracing::debug;
use uuid::Uuid;

use super::SubscriptionStore;
use crate::query::{self, AggregateFilter, AggregateQueryBuilder, SUBSCRIPTION_COLUMNS};
use crate::DatabaseError;

/// Subscription repository backed by a shared connection pool
#[derive(Debug, Clone)]
pub struct PostgresSubscriptionStore {
    pool: Arc<PgPool>,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    fn subscription_from_row(row: &PgRow) -> Result<Subscription, DatabaseError> {
        Ok(Subscription {
            id: row.try_get("id")?,
            service_name: row.try_get("service_name")?,
            price: row.try_get("price")?,
            user_id: row.try_get("user_id")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
        })
    }
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn create(&self, input: NewSubscription) -> Result<Subscription, DatabaseError> {
        let id = Uuid::new_v4().to_string();

        let row = sqlx::query(&format!(
            "INSERT INTO subscriptions ({SUBSCRIPTION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {SUBSCRIPTION_COLUMNS}"
        ))
        .bind(&id)
        .bind(&input.service_name)
        .bind(input.price)
        .bind(&input.user_id)
        .bind(input.start_date)
        .bind(input.end_date)
        .fetch_one(&*self.pool)
        .await?;

        debug!(subscription_id = %id, "Subscription inserted");
        Self::subscription_from_row(&row)
    }

    async fn get(&self, id: &str) -> Result<Subscription, DatabaseError> {
        let row = sqlx::query(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;

        match row {
            Some(row) => Self::subscription_from_row(&row),
            None => Err(DatabaseError::NotFound(id.to_string())),
        }
    }

    async fn list(&self, user_id: Option<String>) -> Result<Vec<Subscription>, DatabaseError> {
        let built = query::list_query(user_id.as_deref());
        let rows = built.to_query().fetch_all(&*self.pool).await?;

        rows.iter().map(Self::subscription_from_row).collect()
    }

    async fn update(&self, update: UpdateDescriptor) -> Result<Subscription, DatabaseError> {
        let Some(built) = query::update_query(&update) else {
            debug!(subscription_id = %update.id, "No-op update, no UPDATE issued");
            return self.get(&update.id).await;
        };

        let row = built.to_query().fetch_optional(&*self.pool).await?;

        match row {
            Some(row) => {
                debug!(
                    subscription_id = %update.id,
                    columns = update.changes.len(),
                    "Subscription updated"
                );
                Self::subscription_from_row(&row)
            }
            None => Err(DatabaseError::NotFound(update.id)),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&*self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(id.to_string()));
        }

        debug!(subscription_id = %id, "Subscription deleted");
        Ok(())
    }

    async fn aggregate(&self, filter: AggregateFilter) -> Result<i64, DatabaseError> {
        let built = AggregateQueryBuilder::from_filter(&filter).build();
        let row = built.to_query().fetch_one(&*self.pool).await?;

        Ok(row.try_get("total")?)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        let row = sqlx::query("SELECT 1").fetch_one(&*self.pool).await?;
        let value: i32 = row.try_get(0)?;

        if value == 1 {
            Ok(())
        } else {
            Err(DatabaseError::Connection(
                "PostgreSQL health probe returned an unexpected value".to_string(),
            ))
        }
    }
}
