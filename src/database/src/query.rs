//! SQL builders for statements whose shape depends on the request
//!
//! Statements are assembled as text plus an ordered list of typed parameters
//! with PostgreSQL positional placeholders (`$1`, `$2`, ...). Placeholders are
//! numbered in the order parameters are pushed, so identical inputs always
//! produce identical SQL.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgArguments, query::Query, Postgres};
use sub_service_shared::{ColumnValue, MonthYear, Subscription, UpdateDescriptor};

/// Columns returned for every subscription read
pub const SUBSCRIPTION_COLUMNS: &str = "id, service_name, price, user_id, start_date, end_date";

/// A typed parameter bound to a positional placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Text(String),
    Integer(i32),
    Timestamp(DateTime<Utc>),
    Month(MonthYear),
    NullableMonth(Option<MonthYear>),
}

impl From<ColumnValue> for QueryParam {
    fn from(value: ColumnValue) -> Self {
        match value {
            ColumnValue::Text(text) => QueryParam::Text(text),
            ColumnValue::Integer(number) => QueryParam::Integer(number),
            ColumnValue::Month(month) => QueryParam::Month(month),
            ColumnValue::NullableMonth(month) => QueryParam::NullableMonth(month),
        }
    }
}

/// SQL text and the parameters for its placeholders, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl BuiltQuery {
    /// Create a query with parameter binding
    pub fn to_query(&self) -> Query<'_, Postgres, PgArguments> {
        let mut query = sqlx::query(&self.sql);

        for param in &self.params {
            query = match param.clone() {
                QueryParam::Text(value) => query.bind(value),
                QueryParam::Integer(value) => query.bind(value),
                QueryParam::Timestamp(value) => query.bind(value),
                QueryParam::Month(value) => query.bind(value),
                QueryParam::NullableMonth(value) => query.bind(value),
            };
        }

        query
    }
}

/// `SELECT` for all subscriptions, optionally for one user, newest start month first
pub fn list_query(user_id: Option<&str>) -> BuiltQuery {
    match user_id {
        Some(user_id) => BuiltQuery {
            sql: format!(
                "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = $1 ORDER BY start_date DESC"
            ),
            params: vec![QueryParam::Text(user_id.to_string())],
        },
        None => BuiltQuery {
            sql: format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions ORDER BY start_date DESC"),
            params: Vec::new(),
        },
    }
}

/// `UPDATE` touching only the columns present in the descriptor.
///
/// Returns `None` when the descriptor has no changes; there is nothing to send.
pub fn update_query(update: &UpdateDescriptor) -> Option<BuiltQuery> {
    if update.is_noop() {
        return None;
    }

    let mut sql = String::from("UPDATE subscriptions SET ");
    let mut params = Vec::with_capacity(update.changes.len() + 1);

    for (index, (column, value)) in update.assignments().into_iter().enumerate() {
        if index > 0 {
            sql.push_str(", ");
        }
        params.push(QueryParam::from(value));
        let _ = write!(sql, "{} = ${}", column.as_str(), params.len());
    }

    params.push(QueryParam::Text(update.id.clone()));
    let _ = write!(
        sql,
        " WHERE id = ${} RETURNING {SUBSCRIPTION_COLUMNS}",
        params.len()
    );

    Some(BuiltQuery { sql, params })
}

/// Inputs of a ranged price sum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateFilter {
    /// Inclusive lower bound on `start_date`
    pub from: DateTime<Utc>,
    /// Inclusive upper bound on `start_date`
    pub to: DateTime<Utc>,
    pub user_id: Option<String>,
    pub service_name: Option<String>,
}

impl AggregateFilter {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            user_id: None,
            service_name: None,
        }
    }

    /// Empty text imposes no constraint
    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id.filter(|value| !value.is_empty());
        self
    }

    /// Empty text imposes no constraint
    pub fn with_service_name(mut self, service_name: Option<String>) -> Self {
        self.service_name = service_name.filter(|value| !value.is_empty());
        self
    }

    /// Whether a subscription contributes to the sum
    pub fn matches(&self, subscription: &Subscription) -> bool {
        let start = subscription.start_date.to_storage_value();

        start >= self.from
            && start <= self.to
            && self
                .user_id
                .as_deref()
                .map_or(true, |user_id| subscription.user_id == user_id)
            && self
                .service_name
                .as_deref()
                .map_or(true, |service| subscription.service_name == service)
    }
}

/// Range-filtered price sum with optional equality filters
pub struct AggregateQueryBuilder {
    sql: String,
    params: Vec<QueryParam>,
}

impl AggregateQueryBuilder {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            sql: "SELECT COALESCE(SUM(price), 0) AS total FROM subscriptions \
                  WHERE start_date >= $1 AND start_date <= $2"
                .to_string(),
            params: vec![QueryParam::Timestamp(from), QueryParam::Timestamp(to)],
        }
    }

    pub fn from_filter(filter: &AggregateFilter) -> Self {
        let mut builder = Self::new(filter.from, filter.to);
        if let Some(user_id) = &filter.user_id {
            builder = builder.filter_user(user_id);
        }
        if let Some(service_name) = &filter.service_name {
            builder = builder.filter_service(service_name);
        }
        builder
    }

    pub fn filter_user(mut self, user_id: &str) -> Self {
        self.add_condition("user_id", QueryParam::Text(user_id.to_string()));
        self
    }

    pub fn filter_service(mut self, service_name: &str) -> Self {
        self.add_condition("service_name", QueryParam::Text(service_name.to_string()));
        self
    }

    fn add_condition(&mut self, column: &str, param: QueryParam) {
        self.params.push(param);
        let _ = write!(self.sql, " AND {} = ${}", column, self.params.len());
    }

    pub fn build(self) -> BuiltQuery {
        BuiltQuery {
            sql: self.sql,
            params: self.params,
        }
    }
}
