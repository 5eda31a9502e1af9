//! OpenAPI documentation

use sub_service_shared::{Subscription, SubscriptionPatch};
use utoipa::OpenApi;

use crate::{
    error::{ErrorDetail, ErrorResponse},
    handlers::{
        health::{self, HealthResponse},
        subscriptions::{self, AggregateResponse, CreateSubscriptionRequest},
    },
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Subscription Service API",
        version = "1.0.0",
        description = "CRUD and cost aggregation for user subscriptions. \
                       Record dates use MM-YYYY; the aggregate query uses YYYY-MM.",
        license(name = "MIT")
    ),
    paths(
        health::health_check,
        health::readiness,
        subscriptions::create_subscription,
        subscriptions::list_subscriptions,
        subscriptions::get_subscription,
        subscriptions::update_subscription,
        subscriptions::delete_subscription,
        subscriptions::aggregate_subscriptions,
    ),
    components(
        schemas(
            Subscription, CreateSubscriptionRequest, SubscriptionPatch,
            AggregateResponse, HealthResponse,
            ErrorResponse, ErrorDetail
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "subscriptions", description = "Subscription management")
    )
)]
pub struct ApiDoc;
