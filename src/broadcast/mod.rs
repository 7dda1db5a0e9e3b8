//! Broadcast sink: the channel through which partial output and control
//! tokens reach observers (a live chat room).
//!
//! Publishing is best-effort. The conversation state is the source of truth;
//! a failed publish is logged and swallowed, never aborting the run.

pub mod party;

pub use party::PartySink;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::RequestId;

/// Sentinel telling observers a confirmation is required before the run
/// continues.
pub const CONFIRM_TOKEN: &str = "\\confirm";

/// Sentinel telling observers the current turn is complete.
pub const DONE_TOKEN: &str = "\\ok";

/// A destination for broadcast messages, keyed by request id.
#[async_trait]
pub trait BroadcastSink: Send + Sync {
    async fn publish(&self, body: &str, request_id: &RequestId) -> Result<()>;
}

/// Publish, logging and swallowing any failure.
pub async fn publish_or_log(sink: &dyn BroadcastSink, body: &str, request_id: &RequestId) {
    if let Err(err) = sink.publish(body, request_id).await {
        tracing::warn!(request_id = %request_id, error = %err, "broadcast publish failed");
    }
}
