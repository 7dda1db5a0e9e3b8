//! Streaming-output coalescer.
//!
//! Converts a stream of small text fragments arriving at unpredictable
//! intervals into a bounded rate of broadcast publishes, while preserving
//! total content and order. Each run owns exactly one coalescer; fragments
//! for different request ids never share a buffer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::broadcast::{publish_or_log, BroadcastSink};
use crate::types::{ChatMessage, FunctionCall, RequestId};

/// Buffers fragments and flushes them to the sink on a debounce timer.
///
/// Fragments are handed to a dedicated task through an unbounded channel, so
/// [`fragment`](Self::fragment) is non-blocking. The task owns the buffer and
/// the single armed flush timer, which is what guarantees that fragments
/// arriving while a flush is pending coalesce into the same publish instead
/// of scheduling a second timer.
#[derive(Debug)]
pub struct Coalescer {
    tx: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<String>>,
}

impl Coalescer {
    /// Spawn the buffering task for one request id.
    pub fn spawn(
        sink: Arc<dyn BroadcastSink>,
        request_id: RequestId,
        interval: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(buffer_loop(rx, sink, request_id, interval));
        Self {
            tx: Some(tx),
            task: Some(task),
        }
    }

    /// Append a fragment. Fire-and-forget; empty fragments are ignored.
    pub fn fragment(&self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        if let Some(tx) = &self.tx {
            let _ = tx.send(text);
        }
    }

    /// Signal end of input, wait for any in-flight flush to resolve, and
    /// return the full concatenation of all fragments in arrival order.
    pub async fn finish(mut self) -> String {
        self.tx.take();
        match self.task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        }
    }
}

impl Drop for Coalescer {
    fn drop(&mut self) {
        // Dropped without finish(): the run was aborted. Kill the task so
        // buffered content is never published after cancellation.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn buffer_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    sink: Arc<dyn BroadcastSink>,
    request_id: RequestId,
    interval: Duration,
) -> String {
    let mut assembled = String::new();
    let mut buffer = String::new();
    // One timer, re-armed on the first fragment after each flush. `armed`
    // is the "is a flush already scheduled" guard.
    let flush = time::sleep(interval);
    tokio::pin!(flush);
    let mut armed = false;

    loop {
        tokio::select! {
            fragment = rx.recv() => {
                let Some(text) = fragment else { break; };
                assembled.push_str(&text);
                buffer.push_str(&text);
                if !armed {
                    flush.as_mut().reset(Instant::now() + interval);
                    armed = true;
                }
            }
            () = &mut flush, if armed => {
                armed = false;
                if !buffer.is_empty() {
                    publish_or_log(sink.as_ref(), &buffer, &request_id).await;
                    buffer.clear();
                }
            }
        }
    }

    // Input ended. Let an armed flush run out at its scheduled deadline so
    // the tail is published without exceeding the configured rate.
    if armed {
        flush.await;
        if !buffer.is_empty() {
            publish_or_log(sink.as_ref(), &buffer, &request_id).await;
        }
    }

    assembled
}

/// Turn the assembled stream text into a message: structured function-call
/// JSON when the model streamed one, plain assistant text otherwise.
pub fn parse_output(text: &str) -> ChatMessage {
    #[derive(serde::Deserialize)]
    struct RawOutput {
        function_call: Option<FunctionCall>,
    }

    if let Ok(raw) = serde_json::from_str::<RawOutput>(text) {
        if let Some(call) = raw.function_call {
            return ChatMessage::assistant_call(call);
        }
    }
    ChatMessage::assistant(text)
}
