//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParleyError, Result};

/// Opaque token identifying one orchestration run end-to-end.
///
/// Callers may supply their own (e.g. a socket connection id); otherwise
/// [`RequestId::generate`] produces a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new unique request id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

/// A function call as emitted by the model: the arguments are raw text and
/// may or may not be valid JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// A message in a conversation. History is append-only; content is never
/// mutated after a message has been appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(
        default,
        rename = "createdAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(text.into()),
            name: None,
            function_call: None,
            created_at: Some(Utc::now()),
        }
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(text.into()),
            name: None,
            function_call: None,
            created_at: Some(Utc::now()),
        }
    }

    /// Create a plain assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(text.into()),
            name: None,
            function_call: None,
            created_at: Some(Utc::now()),
        }
    }

    /// Create an assistant message requesting a function call.
    pub fn assistant_call(call: FunctionCall) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            name: None,
            function_call: Some(call),
            created_at: Some(Utc::now()),
        }
    }

    /// Create a `function`-role message carrying a serialized tool result.
    pub fn function_result(name: impl Into<String>, result: &serde_json::Value) -> Self {
        Self {
            role: Role::Function,
            content: Some(result.to_string()),
            name: Some(name.into()),
            function_call: None,
            created_at: Some(Utc::now()),
        }
    }

    /// Whether this message carries a function call request.
    pub fn is_function_call(&self) -> bool {
        self.function_call
            .as_ref()
            .is_some_and(|call| !call.name.is_empty())
    }
}

/// A function call with arguments parsed into structured data, ready for
/// dispatch against the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCall {
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ParsedCall {
    /// Parse the function call off a message.
    ///
    /// Fails with [`ParleyError::MalformedCall`] when the message has no
    /// function call or its raw arguments are not valid JSON. Empty
    /// arguments parse as an empty object.
    pub fn from_message(message: &ChatMessage) -> Result<Self> {
        let call = message
            .function_call
            .as_ref()
            .ok_or_else(|| ParleyError::MalformedCall("no function call available".into()))?;

        let raw = if call.arguments.is_empty() {
            "{}"
        } else {
            call.arguments.as_str()
        };
        let arguments = serde_json::from_str(raw).map_err(|err| {
            ParleyError::MalformedCall(format!("arguments for '{}': {err}", call.name))
        })?;

        Ok(Self {
            name: call.name.clone(),
            arguments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_call_with_json_arguments() {
        let message = ChatMessage::assistant_call(FunctionCall {
            name: "search_issues".into(),
            arguments: r#"{"search":"login"}"#.into(),
        });

        let call = ParsedCall::from_message(&message).unwrap();
        assert_eq!(call.name, "search_issues");
        assert_eq!(call.arguments["search"], "login");
    }

    #[test]
    fn empty_arguments_parse_as_empty_object() {
        let message = ChatMessage::assistant_call(FunctionCall {
            name: "noop".into(),
            arguments: String::new(),
        });

        let call = ParsedCall::from_message(&message).unwrap();
        assert_eq!(call.arguments, serde_json::json!({}));
    }

    #[test]
    fn malformed_arguments_fail() {
        let message = ChatMessage::assistant_call(FunctionCall {
            name: "search_issues".into(),
            arguments: "{not json".into(),
        });

        let err = ParsedCall::from_message(&message).unwrap_err();
        assert!(matches!(err, ParleyError::MalformedCall(_)));
    }

    #[test]
    fn message_without_call_fails() {
        let message = ChatMessage::assistant("plain answer");
        let err = ParsedCall::from_message(&message).unwrap_err();
        assert!(matches!(err, ParleyError::MalformedCall(_)));
    }

    #[test]
    fn function_result_serializes_content() {
        let result = serde_json::json!({"issues": ["a", "b"]});
        let message = ChatMessage::function_result("search_issues", &result);
        assert_eq!(message.role, Role::Function);
        assert_eq!(message.name.as_deref(), Some("search_issues"));
        assert_eq!(message.content.as_deref(), Some(r#"{"issues":["a","b"]}"#));
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }
}
