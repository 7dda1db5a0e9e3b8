//! Shared test doubles: a scripted provider and a recording sink.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::BoxStream;

use parley::error::{ParleyError, Result};
use parley::provider::{ChatProvider, ChatRequest};
use parley::types::RequestId;

enum ScriptedTurn {
    Fragments(Vec<String>),
    Fail(u16, String),
}

/// Provider returning pre-scripted fragment streams, one per model call.
#[derive(Default)]
pub struct MockProvider {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a plain-text reply, streamed as the given fragments.
    pub fn queue_text(&self, fragments: &[&str]) {
        self.turns.lock().unwrap().push_back(ScriptedTurn::Fragments(
            fragments.iter().map(|f| f.to_string()).collect(),
        ));
    }

    /// Script a function-call reply, streamed in the same envelope framing
    /// the real provider emits.
    pub fn queue_call(&self, name: &str, arguments: &str) {
        let escaped = escape_fragment(arguments);
        self.turns.lock().unwrap().push_back(ScriptedTurn::Fragments(vec![
            format!("{{\"function_call\":{{\"name\":\"{name}\",\"arguments\":\""),
            escaped,
            "\"}}".to_string(),
        ]));
    }

    /// Script an upstream failure.
    pub fn queue_failure(&self, status: u16, message: &str) {
        self.turns
            .lock()
            .unwrap()
            .push_back(ScriptedTurn::Fail(status, message.to_string()));
    }

    /// Number of model calls made so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<String>>> {
        self.requests.lock().unwrap().push(request.clone());
        let turn = self.turns.lock().unwrap().pop_front();
        match turn {
            Some(ScriptedTurn::Fragments(fragments)) => Ok(Box::pin(futures::stream::iter(
                fragments.into_iter().map(Ok),
            ))),
            Some(ScriptedTurn::Fail(status, message)) => {
                Err(ParleyError::upstream(status, message))
            }
            None => Err(ParleyError::InvalidState(
                "no scripted turn left in MockProvider".into(),
            )),
        }
    }
}

fn escape_fragment(text: &str) -> String {
    let quoted = serde_json::to_string(text).unwrap();
    quoted[1..quoted.len() - 1].to_string()
}

/// Sink recording every publish, optionally failing on demand.
#[derive(Default)]
pub struct RecordingSink {
    published: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All published bodies, in publish order.
    pub fn bodies(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }

    /// Bodies published for one request id.
    pub fn bodies_for(&self, request_id: &str) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == request_id)
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub fn contains(&self, body: &str) -> bool {
        self.bodies().iter().any(|b| b == body)
    }

    pub fn count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl parley::broadcast::BroadcastSink for RecordingSink {
    async fn publish(&self, body: &str, request_id: &RequestId) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ParleyError::Stream("sink unavailable".into()));
        }
        self.published
            .lock()
            .unwrap()
            .push((request_id.to_string(), body.to_string()));
        Ok(())
    }
}
