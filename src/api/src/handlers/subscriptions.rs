//! Subscription handlers for CRUD operations and cost aggregation

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use sub_service_database::AggregateFilter;
use sub_service_shared::{
    month_year, MonthYear, NewSubscription, Subscription, SubscriptionPatch,
};
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::{ApiError, Result},
    extract::{ApiJson, ApiQuery},
    state::AppState,
};

/// Create subscription request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubscriptionRequest {
    #[schema(example = "Yandex Plus")]
    pub service_name: String,

    /// Monthly price in the smallest currency unit
    #[validate(range(min = 0, message = "price must be non-negative"))]
    #[schema(example = 400, minimum = 0)]
    pub price: i32,

    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: String,

    #[serde(default, with = "month_year::optional")]
    #[schema(value_type = String, example = "07-2025")]
    pub start_date: Option<MonthYear>,

    #[serde(default, with = "month_year::optional")]
    #[schema(value_type = Option<String>, example = "12-2025")]
    pub end_date: Option<MonthYear>,
}

impl CreateSubscriptionRequest {
    fn into_new_subscription(self) -> Result<NewSubscription> {
        let start_date = self
            .start_date
            .ok_or_else(|| ApiError::validation("start_date", "start_date is required"))?;

        Ok(NewSubscription {
            service_name: self.service_name,
            price: self.price,
            user_id: self.user_id,
            start_date,
            end_date: self.end_date,
        })
    }
}

/// List subscriptions query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSubscriptionsQuery {
    /// Only subscriptions owned by this user
    pub user_id: Option<String>,
}

/// Aggregate query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AggregateQuery {
    /// First month of the range, `YYYY-MM`
    #[param(example = "2025-01")]
    pub from: Option<String>,
    /// Last month of the range (inclusive), `YYYY-MM`
    #[param(example = "2025-07")]
    pub to: Option<String>,
    pub user_id: Option<String>,
    pub service_name: Option<String>,
}

/// Aggregate response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AggregateResponse {
    /// Sum of matching prices
    #[schema(example = 300)]
    pub total: i64,
}

/// POST /api/v1/subs - Create a subscription
#[utoipa::path(
    post,
    path = "/api/v1/subs",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created", body = Subscription),
        (status = 400, description = "Malformed body", body = crate::error::ErrorResponse),
        (status = 500, description = "Backend failure", body = crate::error::ErrorResponse)
    ),
    tag = "subscriptions"
)]
pub async fn create_subscription(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<Subscription>)> {
    request.validate()?;
    let input = request.into_new_subscription()?;

    let subscription = state.store.create(input).await?;

    info!(
        subscription_id = %subscription.id,
        user_id = %subscription.user_id,
        service_name = %subscription.service_name,
        "Subscription created"
    );
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// GET /api/v1/subs - List subscriptions, newest start month first
#[utoipa::path(
    get,
    path = "/api/v1/subs",
    params(ListSubscriptionsQuery),
    responses(
        (status = 200, description = "Subscriptions", body = [Subscription]),
        (status = 400, description = "Malformed query string", body = crate::error::ErrorResponse),
        (status = 500, description = "Backend failure", body = crate::error::ErrorResponse)
    ),
    tag = "subscriptions"
)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListSubscriptionsQuery>,
) -> Result<Json<Vec<Subscription>>> {
    let user_id = query.user_id.filter(|user_id| !user_id.is_empty());
    let subscriptions = state.store.list(user_id).await?;

    debug!(count = subscriptions.len(), "Listed subscriptions");
    Ok(Json(subscriptions))
}

/// GET /api/v1/subs/{id} - Get a subscription
#[utoipa::path(
    get,
    path = "/api/v1/subs/{id}",
    params(("id" = String, Path, description = "Subscription id")),
    responses(
        (status = 200, description = "Subscription", body = Subscription),
        (status = 404, description = "No subscription with this id", body = crate::error::ErrorResponse)
    ),
    tag = "subscriptions"
)]
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Subscription>> {
    let subscription = state.store.get(&id).await?;
    Ok(Json(subscription))
}

/// PUT /api/v1/subs/{id} - Partially update a subscription
///
/// Only fields present in the body are written. `end_date: null` clears the
/// end date. An empty body changes nothing and returns the current record.
#[utoipa::path(
    put,
    path = "/api/v1/subs/{id}",
    params(("id" = String, Path, description = "Subscription id")),
    request_body = SubscriptionPatch,
    responses(
        (status = 200, description = "Updated subscription", body = Subscription),
        (status = 400, description = "Malformed body", body = crate::error::ErrorResponse),
        (status = 404, description = "No subscription with this id", body = crate::error::ErrorResponse)
    ),
    tag = "subscriptions"
)]
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<SubscriptionPatch>,
) -> Result<Json<Subscription>> {
    if patch.price.as_set().is_some_and(|price| *price < 0) {
        return Err(ApiError::validation("price", "price must be non-negative"));
    }

    let update = patch.resolve(id);
    if update.is_noop() {
        debug!(subscription_id = %update.id, "Empty update, returning current record");
        return Ok(Json(state.store.get(&update.id).await?));
    }

    let subscription = state.store.update(update).await?;

    info!(subscription_id = %subscription.id, "Subscription updated");
    Ok(Json(subscription))
}

/// DELETE /api/v1/subs/{id} - Delete a subscription
#[utoipa::path(
    delete,
    path = "/api/v1/subs/{id}",
    params(("id" = String, Path, description = "Subscription id")),
    responses(
        (status = 204, description = "Subscription deleted"),
        (status = 404, description = "No subscription with this id", body = crate::error::ErrorResponse)
    ),
    tag = "subscriptions"
)]
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.store.delete(&id).await?;

    info!(subscription_id = %id, "Subscription deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/subs/aggregate - Sum prices of subscriptions starting in a month range
#[utoipa::path(
    get,
    path = "/api/v1/subs/aggregate",
    params(AggregateQuery),
    responses(
        (status = 200, description = "Total cost", body = AggregateResponse),
        (status = 400, description = "Invalid from or to", body = crate::error::ErrorResponse),
        (status = 500, description = "Backend failure", body = crate::error::ErrorResponse)
    ),
    tag = "subscriptions"
)]
pub async fn aggregate_subscriptions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AggregateQuery>,
) -> Result<Json<AggregateResponse>> {
    let from = parse_query_month(query.from.as_deref(), "from")?;
    let to = parse_query_month(query.to.as_deref(), "to")?;

    // `to` covers its whole month
    let filter = AggregateFilter::new(from.to_storage_value(), to.end_of_month_instant())
        .with_user_id(query.user_id)
        .with_service_name(query.service_name);

    let total = state.store.aggregate(filter).await?;

    debug!(%from, %to, total, "Aggregated subscription cost");
    Ok(Json(AggregateResponse { total }))
}

fn parse_query_month(value: Option<&str>, name: &str) -> Result<MonthYear> {
    MonthYear::parse_query_month(value.unwrap_or_default())
        .map_err(|_| ApiError::validation(name, format!("invalid {name}")))
}
