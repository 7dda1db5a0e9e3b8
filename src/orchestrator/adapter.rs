//! Model call adapter: one chat-completion request, streamed through the
//! coalescer, resolved to a single structured message.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use crate::broadcast::BroadcastSink;
use crate::coalesce::{parse_output, Coalescer};
use crate::error::Result;
use crate::provider::{ChatProvider, ChatRequest};
use crate::types::{ChatMessage, RequestId};

/// Issue one streaming chat-completion request, relaying every fragment
/// through a fresh coalescer, and return the assembled message.
///
/// Upstream failures (status ≥ 400) surface before any fragment is relayed;
/// a mid-stream failure aborts the coalescer so nothing more is published.
/// The caller owns publishing the terminal sentinel in both cases.
pub async fn stream_turn(
    provider: &dyn ChatProvider,
    request: &ChatRequest,
    sink: Arc<dyn BroadcastSink>,
    request_id: RequestId,
    interval: Duration,
) -> Result<ChatMessage> {
    let mut stream = provider.stream_chat(request).await?;
    let coalescer = Coalescer::spawn(sink, request_id, interval);

    while let Some(fragment) = stream.next().await {
        coalescer.fragment(fragment?);
    }

    let text = coalescer.finish().await;
    Ok(parse_output(&text))
}
