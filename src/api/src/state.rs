//! Application state shared by all handlers

use std::sync::Arc;

use sub_service_database::SubscriptionStore;

use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn SubscriptionStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
