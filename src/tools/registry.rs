//! Insertion-ordered tool registry.

use std::sync::Arc;

use crate::error::{ParleyError, Result};
use crate::provider::FunctionDefinition;
use crate::types::{ChatMessage, ParsedCall};

use super::tool::Tool;
use super::validation::validate_arguments;

/// Fixed mapping from tool name to implementation, loaded at startup and
/// immutable during a run. Registration order is the order schemas are
/// presented to the model.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. First registration of a name wins on lookup.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Builder-style registration.
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Look a tool up by exact name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Schemas for every registered tool, in registration order.
    pub fn describe(&self) -> Vec<FunctionDefinition> {
        self.tools
            .iter()
            .map(|t| FunctionDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters().schema.clone(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Invoke the named tool once with validated arguments.
    ///
    /// Fails with [`ParleyError::UnknownTool`] when no tool matches and
    /// [`ParleyError::MalformedCall`] when the arguments don't fit the
    /// tool's declared schema.
    pub async fn invoke(
        &self,
        call: &ParsedCall,
        history: &[ChatMessage],
    ) -> Result<serde_json::Value> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ParleyError::UnknownTool(call.name.clone()))?;

        validate_arguments(&call.arguments, &tool.parameters().schema).map_err(|message| {
            ParleyError::MalformedCall(format!("arguments for '{}': {message}", call.name))
        })?;

        tool.invoke(call, history).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
