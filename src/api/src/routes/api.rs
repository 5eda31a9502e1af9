//! Subscription API routes, mounted under `/api/v1`

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, state::AppState};

/// Create API routes router
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/subs",
            post(handlers::subscriptions::create_subscription)
                .get(handlers::subscriptions::list_subscriptions),
        )
        .route(
            "/subs/aggregate",
            get(handlers::subscriptions::aggregate_subscriptions),
        )
        .route(
            "/subs/:id",
            get(handlers::subscriptions::get_subscription)
                .put(handlers::subscriptions::update_subscription)
                .delete(handlers::subscriptions::delete_subscription),
        )
}
