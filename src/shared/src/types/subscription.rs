//! Subscription record types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::month_year::MonthYear;

/// A stored subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Subscription {
    /// Server-assigned opaque identifier
    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub id: String,

    #[schema(example = "Yandex Plus")]
    pub service_name: String,

    /// Monthly price in the smallest currency unit
    #[schema(example = 400, minimum = 0)]
    pub price: i32,

    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: String,

    #[schema(value_type = String, example = "07-2025")]
    pub start_date: MonthYear,

    #[serde(
        default,
        with = "crate::types::month_year::optional",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, example = "12-2025")]
    pub end_date: Option<MonthYear>,
}

/// Everything needed to insert a subscription; the id is assigned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub service_name: String,
    pub price: i32,
    pub user_id: String,
    pub start_date: MonthYear,
    pub end_date: Option<MonthYear>,
}

impl NewSubscription {
    /// Attach an identifier, producing the stored form
    pub fn with_id(self, id: impl Into<String>) -> Subscription {
        Subscription {
            id: id.into(),
            service_name: self.service_name,
            price: self.price,
            user_id: self.user_id,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}
