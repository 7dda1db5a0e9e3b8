//! OpenAI Chat Completions provider (legacy `functions` calling convention).

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::config::ParleyConfig;
use crate::error::{ParleyError, Result};
use crate::types::ChatMessage;

use super::http::{bearer_headers, parse_sse_data, shared_client};
use super::{ChatProvider, ChatRequest};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    /// Build a provider from config; fails when no API key is set.
    pub fn from_config(config: &ParleyConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ParleyError::Configuration("Missing OPENAI_API_KEY".into()))?;
        Ok(Self::new(
            config.model.clone(),
            api_key,
            config.base_url.clone(),
        ))
    }

    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_wire)
            .collect::<Vec<_>>();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });

        if !request.functions.is_empty() {
            if let Some(obj) = body.as_object_mut() {
                obj.insert(
                    "functions".into(),
                    serde_json::json!(request.functions),
                );
            }
        }

        body
    }
}

/// Map a message to its wire form. Timestamps are local bookkeeping and
/// never reach the provider; `content` is always present (null when absent)
/// as the API requires for function-call messages.
fn message_to_wire(message: &ChatMessage) -> serde_json::Value {
    let mut wire = serde_json::json!({
        "role": message.role,
        "content": message.content,
    });
    if let Some(obj) = wire.as_object_mut() {
        if let Some(ref name) = message.name {
            obj.insert("name".into(), serde_json::json!(name));
        }
        if let Some(ref call) = message.function_call {
            obj.insert("function_call".into(), serde_json::json!(call));
        }
    }
    wire
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<String>>> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %self.model, "OpenAI stream_chat");

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status >= 400 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(upstream_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer = String::new();
            // Set once the function_call envelope has been opened; the
            // closing `"}}` must be emitted exactly once.
            let mut in_call = false;
            futures::pin_mut!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(ParleyError::Network(e));
                        break;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    let Some(data) = parse_sse_data(&line) else { continue; };
                    let chunk = match serde_json::from_str::<StreamChunk>(data) {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            yield Err(ParleyError::Stream(format!("bad SSE chunk: {e}")));
                            continue;
                        }
                    };

                    let Some(choice) = chunk.choices.into_iter().next() else { continue; };

                    if let Some(call) = choice.delta.function_call {
                        if !in_call {
                            let name = call.name.unwrap_or_default();
                            yield Ok(format!(
                                "{{\"function_call\":{{\"name\":\"{}\",\"arguments\":\"",
                                escape_fragment(&name)
                            ));
                            in_call = true;
                        }
                        if let Some(args) = call.arguments {
                            if !args.is_empty() {
                                yield Ok(escape_fragment(&args));
                            }
                        }
                    } else if let Some(text) = choice.delta.content {
                        if !text.is_empty() {
                            yield Ok(text);
                        }
                    }

                    if choice.finish_reason.is_some() && in_call {
                        yield Ok("\"}}".to_string());
                        in_call = false;
                    }
                }
            }

            // Stream ended without a finish_reason; close the envelope so
            // the assembled text still parses.
            if in_call {
                yield Ok("\"}}".to_string());
            }
        };

        Ok(Box::pin(stream))
    }
}

/// JSON-string-escape a fragment for embedding inside the envelope.
fn escape_fragment(text: &str) -> String {
    let quoted = serde_json::to_string(text).unwrap_or_default();
    if quoted.len() >= 2 {
        quoted[1..quoted.len() - 1].to_string()
    } else {
        String::new()
    }
}

fn upstream_error(status: u16, body_text: &str) -> ParleyError {
    match serde_json::from_str::<serde_json::Value>(body_text) {
        Ok(payload) => {
            let message = payload
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("There was an error with the model provider")
                .to_string();
            ParleyError::upstream_with_body(status, message, payload)
        }
        Err(_) => ParleyError::upstream(status, body_text),
    }
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: Delta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Delta {
    content: Option<String>,
    function_call: Option<FunctionCallDelta>,
}

#[derive(Deserialize)]
struct FunctionCallDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}
