// ABOUTME: Configuration loading and validation for the quizd server.
// ABOUTME: Reads QUIZD_* environment variables with defaults suited to local development.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("QUIZD_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("QUIZD_AGENT_URL must be an http(s) URL: {0}")]
    InvalidAgentUrl(String),

    #[error("QUIZD_AGENT_ID must not be empty")]
    EmptyAgentId,
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct QuizdConfig {
    pub bind: SocketAddr,
    pub agent_url: String,
    pub agent_id: String,
}

impl QuizdConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - QUIZD_BIND: socket address to bind (default: 127.0.0.1:7341)
    /// - QUIZD_AGENT_URL: agent platform invoke endpoint
    ///   (default: http://127.0.0.1:8787/api/agents/invoke)
    /// - QUIZD_AGENT_ID: id of the quiz-master agent (default: quiz-master)
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_str =
            std::env::var("QUIZD_BIND").unwrap_or_else(|_| "127.0.0.1:7341".to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let agent_url = std::env::var("QUIZD_AGENT_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8787/api/agents/invoke".to_string());
        if !agent_url.starts_with("http://") && !agent_url.starts_with("https://") {
            return Err(ConfigError::InvalidAgentUrl(agent_url));
        }

        let agent_id =
            std::env::var("QUIZD_AGENT_ID").unwrap_or_else(|_| "quiz-master".to_string());
        if agent_id.trim().is_empty() {
            return Err(ConfigError::EmptyAgentId);
        }

        Ok(Self {
            bind,
            agent_url,
            agent_id,
        })
    }
}
