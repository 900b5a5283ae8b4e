// ABOUTME: Route definitions for the quizd HTTP API.
// ABOUTME: Assembles all session routes into a single Axum Router with shared state.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(api::sessions::create_session))
        .route(
            "/api/sessions/{id}",
            get(api::sessions::get_session).delete(api::sessions::delete_session),
        )
        .route("/api/sessions/{id}/ops", post(api::sessions::dispatch_op))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
