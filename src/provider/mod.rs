//! Model provider trait and the OpenAI implementation.

pub mod http;
pub mod openai;

pub use openai::OpenAiProvider;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ChatMessage;

/// One chat-completion request: full history plus the function schemas the
/// model may call.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub functions: Vec<FunctionDefinition>,
}

/// Function schema sent to the provider API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A chat-completion backend.
///
/// The stream yields plain text fragments. Function-call deltas are re-framed
/// by the implementation into the `{"function_call": ...}` text envelope so
/// downstream consumers see one uniform fragment stream.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<String>>>;
}
