//! HTTP sink posting to a party room endpoint.
//!
//! The room server is expected to broadcast the body verbatim to every
//! connected client.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::provider::http::shared_client;
use crate::types::RequestId;

use super::BroadcastSink;

#[derive(Serialize)]
struct PartyMessage<'a> {
    #[serde(rename = "requestId")]
    request_id: &'a str,
    body: &'a str,
}

/// Sink POSTing `{requestId, body}` JSON to a configured room URL.
#[derive(Debug, Clone)]
pub struct PartySink {
    url: String,
}

impl PartySink {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl BroadcastSink for PartySink {
    async fn publish(&self, body: &str, request_id: &RequestId) -> Result<()> {
        let message = PartyMessage {
            request_id: request_id.as_str(),
            body,
        };
        shared_client()
            .post(&self.url)
            .json(&message)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
