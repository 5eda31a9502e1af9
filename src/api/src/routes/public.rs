//! Operational routes outside the versioned API

use axum::{routing::get, Router};

use crate::{handlers, state::AppState};

/// Create public routes router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness))
}
