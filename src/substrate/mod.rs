//! Durable execution substrate contract.
//!
//! The orchestrator funnels every unit of work that must survive a crash —
//! model calls, tool invocations, gate publishes — through [`Substrate::run_step`],
//! and suspends on external events through [`Substrate::wait_for_event`]. A
//! real durable engine can memoize step results and resume a run without
//! re-running completed steps or double-invoking a tool with side effects.
//! [`InProcess`] is the engine-less implementation used in a single process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::Result;

/// Event name a confirmation gate suspends on.
pub const CHAT_CONFIRMED_EVENT: &str = "chat.confirmed";

/// A unit of retryable work. Results are JSON so an engine can persist them.
pub type StepFuture<'a> = BoxFuture<'a, Result<serde_json::Value>>;

#[async_trait]
pub trait Substrate: Send + Sync {
    /// Run one named step to completion.
    async fn run_step<'a>(&self, name: &str, step: StepFuture<'a>) -> Result<serde_json::Value>;

    /// Suspend until an event with the given name and match key arrives, or
    /// the timeout elapses (`None`). Never a busy-poll.
    async fn wait_for_event(
        &self,
        event: &str,
        key: &str,
        timeout: Duration,
    ) -> Option<serde_json::Value>;
}

/// In-process event delivery: one waiter per (event, key) pair.
#[derive(Debug, Default)]
pub struct EventBus {
    pending: Mutex<HashMap<(String, String), oneshot::Sender<serde_json::Value>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to its waiter. Returns false when nobody is waiting
    /// (or the waiter already went away).
    pub fn deliver(&self, event: &str, key: &str, payload: serde_json::Value) -> bool {
        let sender = self
            .pending
            .lock()
            .expect("event bus lock poisoned")
            .remove(&(event.to_string(), key.to_string()));
        match sender {
            Some(tx) => tx.send(payload).is_ok(),
            None => false,
        }
    }

    async fn wait(
        &self,
        event: &str,
        key: &str,
        timeout: Duration,
    ) -> Option<serde_json::Value> {
        let (tx, rx) = oneshot::channel();
        let entry = (event.to_string(), key.to_string());
        {
            let mut pending = self.pending.lock().expect("event bus lock poisoned");
            // A newer wait for the same key supersedes a stale one.
            pending.insert(entry.clone(), tx);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(payload)) => Some(payload),
            _ => {
                let mut pending = self.pending.lock().expect("event bus lock poisoned");
                pending.remove(&entry);
                None
            }
        }
    }
}

/// Substrate that runs steps inline and waits on an [`EventBus`].
#[derive(Debug, Clone, Default)]
pub struct InProcess {
    events: Arc<EventBus>,
}

impl InProcess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bus(events: Arc<EventBus>) -> Self {
        Self { events }
    }

    /// The bus external callers deliver events through.
    pub fn bus(&self) -> Arc<EventBus> {
        self.events.clone()
    }
}

#[async_trait]
impl Substrate for InProcess {
    async fn run_step<'a>(&self, name: &str, step: StepFuture<'a>) -> Result<serde_json::Value> {
        debug!(step = name, "run step");
        step.await
    }

    async fn wait_for_event(
        &self,
        event: &str,
        key: &str,
        timeout: Duration,
    ) -> Option<serde_json::Value> {
        self.events.wait(event, key, timeout).await
    }
}
