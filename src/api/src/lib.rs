//! Subscription Service API Library
//!
//! HTTP surface for managing subscription records: routing, middleware,
//! request extraction and error mapping. Persistence lives in
//! `sub_service_database`; domain types in `sub_service_shared`.

pub mod config;
pub mod docs;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware_layer;
pub mod routes;
pub mod state;

pub use config::{Config, ObservabilityConfig, ServerConfig};
pub use error::{ApiError, Result};
pub use state::AppState;

use std::any::Any;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    middleware,
    response::{IntoResponse, Response},
    BoxError, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the main application router with all middleware and routes
pub fn build_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.timeout_seconds);

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .nest("/api/v1", routes::api::router())
        .merge(routes::public::router())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(
                    middleware_layer::logging::logging_middleware,
                ))
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(request_timeout),
        )
        .with_state(state)
}

/// Map errors raised by tower middleware onto API errors
async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::timeout("request took too long")
    } else {
        ApiError::internal(format!("unhandled middleware error: {err}"))
    }
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::internal(format!("handler panicked: {detail}")).into_response()
}
