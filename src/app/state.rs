//! Application state management.

use std::sync::Arc;

use super::service::AppService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AppService>,
}

impl AppState {
    /// Create a new application state
    #[must_use]
    pub fn new(service: AppService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
