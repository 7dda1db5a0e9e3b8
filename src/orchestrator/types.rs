//! Run outcome types.

use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

/// Terminal status of one orchestration run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
    Canceled,
}

/// Result of one orchestration run: the full conversation plus how the run
/// ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    pub fn completed(messages: Vec<ChatMessage>) -> Self {
        Self {
            status: RunStatus::Completed,
            messages,
            error: None,
        }
    }

    pub fn failed(messages: Vec<ChatMessage>, error: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            messages,
            error: Some(error.into()),
        }
    }

    pub fn canceled() -> Self {
        Self {
            status: RunStatus::Canceled,
            messages: Vec::new(),
            error: None,
        }
    }
}
