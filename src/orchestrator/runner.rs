//! The orchestration loop and its run handle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::broadcast::{publish_or_log, BroadcastSink, CONFIRM_TOKEN, DONE_TOKEN};
use crate::config::ParleyConfig;
use crate::error::{ParleyError, Result};
use crate::provider::{ChatProvider, ChatRequest};
use crate::substrate::{Substrate, CHAT_CONFIRMED_EVENT};
use crate::tools::ToolRegistry;
use crate::types::{ChatMessage, ParsedCall, RequestId};

use super::adapter;
use super::types::RunOutcome;

/// Synthetic assistant reply appended when a gated call is declined or the
/// confirmation times out.
pub const DECLINE_NOTE: &str = "You haven't given me permission to call this function. \
I'll ignore the last function call request.";

/// Request payload to start a run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub request_id: RequestId,
    pub messages: Vec<ChatMessage>,
}

impl RunRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            request_id: RequestId::generate(),
            messages,
        }
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }
}

/// Handle for an in-flight run.
#[derive(Debug)]
pub struct RunHandle {
    request_id: RequestId,
    abort_tx: Option<oneshot::Sender<()>>,
    result_rx: oneshot::Receiver<RunOutcome>,
}

impl RunHandle {
    fn new(
        request_id: RequestId,
    ) -> (Self, oneshot::Receiver<()>, oneshot::Sender<RunOutcome>) {
        let (abort_tx, abort_rx) = oneshot::channel();
        let (result_tx, result_rx) = oneshot::channel();
        (
            Self {
                request_id,
                abort_tx: Some(abort_tx),
                result_rx,
            },
            abort_rx,
            result_tx,
        )
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Signal the run to abort. Returns false if the run already finished
    /// or an abort was already sent.
    pub fn abort(&mut self) -> bool {
        if let Some(tx) = self.abort_tx.take() {
            return tx.send(()).is_ok();
        }
        false
    }

    /// Wait for the run to finish.
    pub async fn wait(self) -> RunOutcome {
        self.result_rx
            .await
            .unwrap_or_else(|_| RunOutcome::canceled())
    }
}

/// Drives repeated model-call / confirmation-gate / tool-invocation cycles
/// for independent request ids. Each started run owns its conversation and
/// never shares mutable state with another.
pub struct Orchestrator {
    provider: Arc<dyn ChatProvider>,
    registry: Arc<ToolRegistry>,
    sink: Arc<dyn BroadcastSink>,
    substrate: Arc<dyn Substrate>,
    config: ParleyConfig,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        registry: Arc<ToolRegistry>,
        sink: Arc<dyn BroadcastSink>,
        substrate: Arc<dyn Substrate>,
        config: ParleyConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            sink,
            substrate,
            config,
        }
    }

    /// Start a run. The loop executes on its own task; the returned handle
    /// aborts it or awaits its outcome.
    pub fn start(&self, request: RunRequest) -> RunHandle {
        let (handle, mut abort_rx, result_tx) = RunHandle::new(request.request_id.clone());

        let turn = TurnContext {
            provider: self.provider.clone(),
            registry: self.registry.clone(),
            sink: self.sink.clone(),
            substrate: self.substrate.clone(),
            request_id: request.request_id,
            coalesce_interval: self.config.coalesce_interval,
            confirm_timeout: self.config.confirm_timeout,
            max_turns: self.config.max_turns,
        };

        tokio::spawn(async move {
            debug!(request_id = %turn.request_id, "run start");
            let outcome = tokio::select! {
                outcome = turn.run(request.messages) => outcome,
                // Abort drops the run future at whichever suspension point
                // it is parked on; the coalescer task dies with it.
                _ = &mut abort_rx => {
                    debug!(request_id = %turn.request_id, "run canceled");
                    RunOutcome::canceled()
                }
            };
            let _ = result_tx.send(outcome);
        });

        handle
    }
}

struct TurnContext {
    provider: Arc<dyn ChatProvider>,
    registry: Arc<ToolRegistry>,
    sink: Arc<dyn BroadcastSink>,
    substrate: Arc<dyn Substrate>,
    request_id: RequestId,
    coalesce_interval: Duration,
    confirm_timeout: Duration,
    max_turns: usize,
}

impl TurnContext {
    async fn run(&self, mut messages: Vec<ChatMessage>) -> RunOutcome {
        match self.call_model(&messages).await {
            Ok(reply) => messages.push(reply),
            Err(err) => return RunOutcome::failed(messages, err.to_string()),
        }

        let mut turns = 0usize;
        loop {
            let Some(last) = messages.last() else { break };
            if !last.is_function_call() {
                break;
            }

            turns += 1;
            if turns > self.max_turns {
                return RunOutcome::failed(messages, "function-call loop exceeded max turns");
            }

            let call = match ParsedCall::from_message(last) {
                Ok(call) => call,
                Err(err) => {
                    let note = format!(
                        "I couldn't make sense of that function call ({err}). \
                         I'll ignore the last function call request."
                    );
                    return self.end_turn_with_note(messages, note).await;
                }
            };

            let gated = self
                .registry
                .get(&call.name)
                .is_some_and(|tool| tool.requires_confirmation());
            if gated && !self.await_confirmation().await {
                // Timeout and explicit denial are indistinguishable here.
                self.publish_step(
                    "publish-deny",
                    vec![DECLINE_NOTE.to_string(), DONE_TOKEN.to_string()],
                )
                .await;
                messages.push(ChatMessage::assistant(DECLINE_NOTE));
                return RunOutcome::completed(messages);
            }

            let invoked = {
                let step_name = format!("call-function {}", call.name);
                let registry = self.registry.clone();
                let call = call.clone();
                let history = messages.clone();
                self.substrate
                    .run_step(
                        &step_name,
                        Box::pin(async move { registry.invoke(&call, &history).await }),
                    )
                    .await
            };

            match invoked {
                Ok(result) => messages.push(ChatMessage::function_result(&call.name, &result)),
                Err(err) if err.is_turn_fatal() => {
                    let note = format!(
                        "I can't run that function ({err}). \
                         I'll ignore the last function call request."
                    );
                    return self.end_turn_with_note(messages, note).await;
                }
                Err(err) => return RunOutcome::failed(messages, err.to_string()),
            }

            match self.call_model(&messages).await {
                Ok(reply) => messages.push(reply),
                Err(err) => return RunOutcome::failed(messages, err.to_string()),
            }
        }

        RunOutcome::completed(messages)
    }

    /// One model call: stream through a fresh coalescer, then publish the
    /// terminal sentinel whether the call succeeded or not.
    async fn call_model(&self, messages: &[ChatMessage]) -> Result<ChatMessage> {
        let request = ChatRequest {
            messages: messages.to_vec(),
            functions: self.registry.describe(),
        };
        let provider = self.provider.clone();
        let sink = self.sink.clone();
        let request_id = self.request_id.clone();
        let interval = self.coalesce_interval;

        let value = self
            .substrate
            .run_step(
                "call-model",
                Box::pin(async move {
                    let turn = adapter::stream_turn(
                        provider.as_ref(),
                        &request,
                        sink.clone(),
                        request_id.clone(),
                        interval,
                    )
                    .await;
                    publish_or_log(sink.as_ref(), DONE_TOKEN, &request_id).await;
                    let message = turn?;
                    serde_json::to_value(&message).map_err(ParleyError::from)
                }),
            )
            .await?;

        serde_json::from_value(value).map_err(ParleyError::from)
    }

    /// Run the confirmation gate: publish the confirm token, then suspend
    /// until a matching event arrives or the timeout elapses.
    async fn await_confirmation(&self) -> bool {
        self.publish_step("publish-confirmation", vec![CONFIRM_TOKEN.to_string()])
            .await;

        let event = self
            .substrate
            .wait_for_event(
                CHAT_CONFIRMED_EVENT,
                self.request_id.as_str(),
                self.confirm_timeout,
            )
            .await;

        event
            .as_ref()
            .and_then(|payload| payload.get("confirm"))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// End the turn with an assistant-visible note: publish it plus the
    /// terminal sentinel, append it, and complete.
    async fn end_turn_with_note(
        &self,
        mut messages: Vec<ChatMessage>,
        note: String,
    ) -> RunOutcome {
        self.publish_step("publish-note", vec![note.clone(), DONE_TOKEN.to_string()])
            .await;
        messages.push(ChatMessage::assistant(note));
        RunOutcome::completed(messages)
    }

    /// Publish a sequence of bodies as one durable step. Failures are logged
    /// and swallowed; broadcast is best-effort.
    async fn publish_step(&self, name: &str, bodies: Vec<String>) {
        let sink = self.sink.clone();
        let request_id = self.request_id.clone();
        let result = self
            .substrate
            .run_step(
                name,
                Box::pin(async move {
                    for body in &bodies {
                        publish_or_log(sink.as_ref(), body, &request_id).await;
                    }
                    Ok(serde_json::Value::Null)
                }),
            )
            .await;
        if let Err(err) = result {
            warn!(step = name, error = %err, "publish step failed");
        }
    }
}
