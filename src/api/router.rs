//! Route table and middleware stack.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    ApiDoc, access_handler, balance_handler, health_check_handler, liveness_handler,
    network_handler, readiness_handler,
};
use crate::app::AppState;

/// Middleware toggles
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterConfig {
    /// Allow cross-origin requests from any origin (the dashboard frontend)
    pub enable_cors: bool,
}

/// Create the router with default middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    create_router_with_config(state, RouterConfig::default())
}

pub fn create_router_with_config(state: Arc<AppState>, config: RouterConfig) -> Router {
    let api = Router::new()
        .route("/access", get(access_handler))
        .route("/balance/{address}", get(balance_handler))
        .route("/network", get(network_handler))
        .route("/health", get(health_check_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .with_state(state);

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    if config.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
