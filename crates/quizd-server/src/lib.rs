// ABOUTME: HTTP server for quizd, exposing session lifecycle and operations as a JSON API.
// ABOUTME: Axum router over a shared session registry; views are read-only projections.

pub mod api;
pub mod app_state;
pub mod config;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, QuizdConfig};
pub use routes::create_router;
