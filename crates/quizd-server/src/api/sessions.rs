// ABOUTME: Session lifecycle and operation dispatch handlers for the quiz API.
// ABOUTME: Routes operations to session controller actors and maps controller errors to HTTP statuses.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use ulid::Ulid;

use quizd_agent::{ControllerError, SessionControllerHandle, SessionOp};
use quizd_core::SessionError;

use crate::app_state::SharedState;

/// POST /api/sessions - Create a fresh quiz session and return its id.
pub async fn create_session(State(state): State<SharedState>) -> impl IntoResponse {
    let handle = quizd_agent::spawn(Arc::clone(&state.gateway), state.agent_id.clone());
    let session_id = handle.session_id;

    state.sessions.write().await.insert(session_id, handle);
    tracing::info!(%session_id, "session created");

    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "session_id": session_id.to_string() })),
    )
}

/// GET /api/sessions/{id} - Read-only display state for one session.
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let handle = match lookup(&state, &id).await {
        Ok(h) => h,
        Err(resp) => return resp,
    };

    let view = handle.view().await;
    (StatusCode::OK, Json(view)).into_response()
}

/// POST /api/sessions/{id}/ops - Dispatch one session operation.
pub async fn dispatch_op(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(op): Json<SessionOp>,
) -> impl IntoResponse {
    let handle = match lookup(&state, &id).await {
        Ok(h) => h,
        Err(resp) => return resp,
    };

    match handle.dispatch(op).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(ControllerError::Session(SessionError::ExchangeInFlight)) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "an exchange is already in flight" })),
        )
            .into_response(),
        Err(ControllerError::Session(e)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": format!("{}", e) })),
        )
            .into_response(),
        Err(ControllerError::ChannelClosed) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "session controller is gone" })),
        )
            .into_response(),
    }
}

/// DELETE /api/sessions/{id} - Discard a session entirely.
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let session_id = match id.parse::<Ulid>() {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "invalid session id" })),
            )
                .into_response();
        }
    };

    // Dropping the handle closes the op channel and the actor task ends.
    match state.sessions.write().await.remove(&session_id) {
        Some(_) => {
            tracing::info!(%session_id, "session deleted");
            (StatusCode::OK, Json(serde_json::json!({ "deleted": true }))).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "session not found" })),
        )
            .into_response(),
    }
}

/// Parse the id and clone the handle out of the registry so the map lock is
/// not held across a gateway exchange.
async fn lookup(
    state: &SharedState,
    id: &str,
) -> Result<SessionControllerHandle, axum::response::Response> {
    let session_id = id.parse::<Ulid>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "invalid session id" })),
        )
            .into_response()
    })?;

    state
        .sessions
        .read()
        .await
        .get(&session_id)
        .cloned()
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "session not found" })),
            )
                .into_response()
        })
}
