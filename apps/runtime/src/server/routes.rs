//! Router configuration for the runtime.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::AppState;
use super::handlers;

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check for the hosting runtime
        .route("/ping", get(handlers::ping))
        // Full pipeline
        .route("/invocations", post(handlers::invocations))
        // Individual agent and gateway tools
        .route("/tools", get(handlers::list_tools))
        .route("/tools/:name", post(handlers::invoke_tool))
        // Action-group events
        .route("/actions", post(handlers::action_group))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
