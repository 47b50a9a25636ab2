//! HTTP server module

mod api;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::{AppState, middleware::auth_middleware};

pub use api::HealthResponse;

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    let assessments = Router::new()
        .route("/api/learning-style/assess", post(api::assess))
        .route("/api/assessment/chat", post(api::assess))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    Router::new()
        .route("/api/health", get(api::health))
        .merge(assessments)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
