// ABOUTME: Shared application state for the quizd HTTP server.
// ABOUTME: Holds the session registry, the gateway, and the configured agent id.

use std::collections::HashMap;
use std::sync::Arc;

use quizd_agent::{AgentGateway, SessionControllerHandle};
use tokio::sync::RwLock;
use ulid::Ulid;

/// Shared application state accessible by all Axum handlers. Stores the
/// session controllers keyed by their ULID plus the gateway every new
/// session talks through.
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<Ulid, SessionControllerHandle>>>,
    pub gateway: Arc<dyn AgentGateway>,
    pub agent_id: String,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create a new AppState with an empty session registry.
    pub fn new(gateway: Arc<dyn AgentGateway>, agent_id: impl Into<String>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            gateway,
            agent_id: agent_id.into(),
        }
    }
}
