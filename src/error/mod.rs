//! Error types for Parley.

use thiserror::Error;

/// Primary error type for all Parley operations.
#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error (status {status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        /// Raw error payload returned by the model provider.
        body: Option<serde_json::Value>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed function call: {0}")]
    MalformedCall(String),

    #[error("Unknown function: {0}")]
    UnknownTool(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Tool execution error: {tool_name} — {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl ParleyError {
    /// Create an upstream error without a payload.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Create an upstream error carrying the provider's error payload.
    pub fn upstream_with_body(
        status: u16,
        message: impl Into<String>,
        body: serde_json::Value,
    ) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
            body: Some(body),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Whether this error ends the turn with an assistant-visible note
    /// rather than failing the orchestration.
    pub fn is_turn_fatal(&self) -> bool {
        matches!(self, Self::MalformedCall(_) | Self::UnknownTool(_))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ParleyError>;
