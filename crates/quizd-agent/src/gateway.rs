// ABOUTME: Defines the AgentGateway trait that reaches the external quiz-master responder.
// ABOUTME: Also defines GatewayError, the failure taxonomy every exchange collapses into.

use async_trait::async_trait;

use quizd_core::{QuizResult, Turn};

/// What can go wrong talking to the agent. All three variants collapse to
/// the same retryable failure at the session controller; the distinction
/// only shapes the user-facing message.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("agent reported failure: {0}")]
    Unsuccessful(String),

    #[error("empty or malformed agent payload")]
    EmptyPayload,
}

/// The single operation the core depends on. The agent behind it is an
/// opaque collaborator: handed the full transcript plus one new message, it
/// returns one structured result. `agent_id` is static configuration;
/// `history` is empty only on the very first call of a session.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    async fn invoke(
        &self,
        agent_id: &str,
        message: &str,
        history: &[Turn],
    ) -> Result<QuizResult, GatewayError>;
}
