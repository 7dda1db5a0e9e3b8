//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::types::ToolParameters;
use crate::error::Result;
use crate::types::{ChatMessage, ParsedCall};

/// Core tool trait — implement to expose a function to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema parameters.
    fn parameters(&self) -> &ToolParameters;

    /// Whether invocation must pass the confirmation gate first.
    fn requires_confirmation(&self) -> bool {
        false
    }

    /// Execute the tool. The full conversation history is available for
    /// tools that need context beyond their arguments.
    async fn invoke(
        &self,
        call: &ParsedCall,
        history: &[ChatMessage],
    ) -> Result<serde_json::Value>;
}

/// Type alias for the tool handler function.
type ToolHandler = dyn Fn(
        ParsedCall,
        Vec<ChatMessage>,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct FnTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    confirm: bool,
    handler: Arc<ToolHandler>,
}

impl FnTool {
    /// Create a tool from a closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ParsedCall, Vec<ChatMessage>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            confirm: false,
            handler: Arc::new(move |call, history| Box::pin(handler(call, history))),
        }
    }

    /// Mark this tool as requiring out-of-band confirmation.
    pub fn confirmed(mut self) -> Self {
        self.confirm = true;
        self
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    fn requires_confirmation(&self) -> bool {
        self.confirm
    }

    async fn invoke(
        &self,
        call: &ParsedCall,
        history: &[ChatMessage],
    ) -> Result<serde_json::Value> {
        (self.handler)(call.clone(), history.to_vec()).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("confirm", &self.confirm)
            .finish()
    }
}
