//! In-process router behind the (out-of-scope) transport layer: maps the
//! boundary triggers onto orchestrator runs.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::orchestrator::{Orchestrator, RunHandle, RunOutcome, RunRequest};
use crate::substrate::{EventBus, CHAT_CONFIRMED_EVENT};
use crate::types::{ConfirmRequest, RequestId, StartRequest};

/// Tracks one run per request id and routes confirmations and cancellations
/// to it.
pub struct ChatService {
    orchestrator: Orchestrator,
    events: Arc<EventBus>,
    active: Mutex<HashMap<String, RunHandle>>,
}

impl ChatService {
    pub fn new(orchestrator: Orchestrator, events: Arc<EventBus>) -> Self {
        Self {
            orchestrator,
            events,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Start an orchestration for the given history, generating a request id
    /// when the caller didn't supply one.
    ///
    /// At most one run is active per request id: a duplicate start aborts
    /// the previous run before the new one begins.
    pub async fn start(&self, request: StartRequest) -> RequestId {
        let request_id = request.request_id.unwrap_or_else(RequestId::generate);

        let mut active = self.active.lock().await;
        if let Some(mut previous) = active.remove(request_id.as_str()) {
            previous.abort();
        }

        let handle = self.orchestrator.start(
            RunRequest::new(request.messages).with_request_id(request_id.clone()),
        );
        active.insert(request_id.to_string(), handle);

        request_id
    }

    /// Resolve a pending confirmation gate. Returns false when no gate is
    /// waiting for this request id.
    pub fn confirm(&self, request: ConfirmRequest) -> bool {
        self.events.deliver(
            CHAT_CONFIRMED_EVENT,
            request.request_id.as_str(),
            serde_json::json!({ "confirm": request.confirm }),
        )
    }

    /// Abort an in-flight run. Returns false when none is tracked.
    pub async fn cancel(&self, request_id: &RequestId) -> bool {
        match self.active.lock().await.remove(request_id.as_str()) {
            Some(mut handle) => handle.abort(),
            None => false,
        }
    }

    /// Await the outcome of a tracked run, releasing its slot.
    pub async fn wait(&self, request_id: &RequestId) -> Option<RunOutcome> {
        let handle = self.active.lock().await.remove(request_id.as_str())?;
        Some(handle.wait().await)
    }
}
