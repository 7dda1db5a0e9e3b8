//! Inbound trigger shapes at the system boundary.
//!
//! These are the minimal message shapes an external caller (typically an
//! HTTP handler) uses to drive the orchestrator; the transport itself is
//! out of scope.

use serde::{Deserialize, Serialize};

use super::message::{ChatMessage, RequestId};

/// Starts a new orchestration for the given history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub messages: Vec<ChatMessage>,
    /// Generated when absent.
    #[serde(
        default,
        rename = "requestId",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_id: Option<RequestId>,
}

/// Resolves a pending confirmation gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmRequest {
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
    pub confirm: bool,
}

/// Aborts an in-flight orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
}
