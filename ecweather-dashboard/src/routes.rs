//! Route definitions

use axum::{Router, routing::get};

use crate::{handlers, state::AppState};

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Dashboard page
        .route("/", get(handlers::dashboard::dashboard))
        // Health
        .route("/health", get(handlers::health::health_check))
        // JSON API
        .route("/api/sites", get(handlers::api::list_sites))
        .route("/api/conditions", get(handlers::api::current_conditions))
        .route("/api/history", get(handlers::api::history))
        .with_state(state)
}
