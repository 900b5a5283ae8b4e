// ABOUTME: HTTP implementation of AgentGateway speaking the agent platform's invoke envelope.
// ABOUTME: Collapses transport failures, success=false, and missing/malformed payloads into GatewayError.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use quizd_core::{QuizResult, Turn};

use crate::gateway::{AgentGateway, GatewayError};

/// Gateway that POSTs invoke requests to an agent platform endpoint.
///
/// The wire shape is the platform's standard envelope: the request carries
/// `{agent_id, message, history}` and the response is
/// `{"success": bool, "response": {"result": {...}}, "error"?: string}`.
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGateway {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Serialize)]
struct InvokeRequest<'a> {
    agent_id: &'a str,
    message: &'a str,
    history: &'a [Turn],
}

#[derive(Debug, Deserialize)]
struct InvokeEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    response: Option<InvokeResponse>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    result: Option<Value>,
}

/// Extract the structured result from a decoded envelope. Split out from the
/// transport so the tolerance rules are unit-testable.
fn result_from_envelope(envelope: InvokeEnvelope) -> Result<QuizResult, GatewayError> {
    if !envelope.success {
        return Err(GatewayError::Unsuccessful(
            envelope
                .error
                .unwrap_or_else(|| "agent call unsuccessful".to_string()),
        ));
    }

    let value = envelope
        .response
        .and_then(|r| r.result)
        .ok_or(GatewayError::EmptyPayload)?;
    if !value.is_object() {
        return Err(GatewayError::EmptyPayload);
    }

    serde_json::from_value(value).map_err(|_| GatewayError::EmptyPayload)
}

#[async_trait]
impl AgentGateway for HttpGateway {
    async fn invoke(
        &self,
        agent_id: &str,
        message: &str,
        history: &[Turn],
    ) -> Result<QuizResult, GatewayError> {
        tracing::debug!(agent_id, history_len = history.len(), "invoking quiz agent");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&InvokeRequest {
                agent_id,
                message,
                history,
            })
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Transport(format!(
                "agent endpoint returned {}: {}",
                status, body
            )));
        }

        let envelope: InvokeEnvelope = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("failed to decode response: {}", e)))?;

        result_from_envelope(envelope)
    }
}
