//! The ingestion transport: POST `/v1/ingest/batch`, implemented against
//! a pluggable [`IngestionClient`] trait so a
//! real collaborator (HTTP ingestion routing is a non-goal of this
//! repository) can be substituted by anything that accepts the same wire
//! shape.

use crate::error::{Error, Result};
use async_trait::async_trait;
use facto_core::FactoEvent;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

/// Request timeout for the default `reqwest::Client`. The batcher wraps
/// each `send_batch` call in its own deadline too; this is a second,
/// independent bound so a client built via `HttpIngestionClient::new`
/// never hangs even when reused outside a `Batcher`.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct IngestBatchRequest<'a> {
    events: &'a [FactoEvent],
}

/// The collaborator's acceptance response to a batch POST.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestBatchResponse {
    pub accepted_count: u64,
    pub rejected_count: u64,
}

/// Sends one batch of events to the ingestion collaborator and reports
/// what happened. Implementations own their own connection pool; the
/// batcher does not reach into this trait's internals.
#[async_trait]
pub trait IngestionClient: Send + Sync {
    async fn send_batch(&self, events: &[FactoEvent]) -> Result<IngestBatchResponse>;
}

/// The default, `reqwest`-backed implementation: POSTs to
/// `{endpoint}/v1/ingest/batch` and requires HTTP 202 Accepted.
pub struct HttpIngestionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpIngestionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .expect("reqwest::Client::builder with only a timeout set never fails");
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl IngestionClient for HttpIngestionClient {
    async fn send_batch(&self, events: &[FactoEvent]) -> Result<IngestBatchResponse> {
        let url = format!("{}/v1/ingest/batch", self.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&IngestBatchRequest { events })
            .send()
            .await
            .map_err(|e| Error::SendFailed(e.to_string()))?;

        if response.status().as_u16() != 202 {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SendRejected { status, body });
        }

        response
            .json::<IngestBatchResponse>()
            .await
            .map_err(|e| Error::SendFailed(e.to_string()))
    }
}

/// An in-memory collaborator stub for tests: records every batch it
/// receives and always accepts, unless told to fail the next N calls.
#[derive(Default)]
pub struct RecordingIngestionClient {
    received: Mutex<Vec<Vec<FactoEvent>>>,
    fail_next: Mutex<usize>,
}

impl RecordingIngestionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` calls to `send_batch` fail with `SendFailed`.
    pub fn fail_next(&self, n: usize) {
        *self.fail_next.lock().expect("lock poisoned") = n;
    }

    /// All events across every batch received so far, in receipt order.
    pub fn received_events(&self) -> Vec<FactoEvent> {
        self.received
            .lock()
            .expect("lock poisoned")
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn batch_count(&self) -> usize {
        self.received.lock().expect("lock poisoned").len()
    }
}

#[async_trait]
impl IngestionClient for RecordingIngestionClient {
    async fn send_batch(&self, events: &[FactoEvent]) -> Result<IngestBatchResponse> {
        {
            let mut fail_next = self.fail_next.lock().expect("lock poisoned");
            if *fail_next > 0 {
                *fail_next -= 1;
                return Err(Error::SendFailed("injected test failure".into()));
            }
        }
        let accepted = events.len() as u64;
        self.received
            .lock()
            .expect("lock poisoned")
            .push(events.to_vec());
        Ok(IngestBatchResponse {
            accepted_count: accepted,
            rejected_count: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facto_core::builder::{BuildParams, EventBuilder};

    #[tokio::test]
    async fn recording_client_accepts_and_records_events() {
        let client = RecordingIngestionClient::new();
        let mut builder = EventBuilder::new("agent-1", "session-1");
        let event = builder.build(BuildParams::new("test")).unwrap();

        let response = client.send_batch(&[event]).await.unwrap();
        assert_eq!(response.accepted_count, 1);
        assert_eq!(client.batch_count(), 1);
        assert_eq!(client.received_events().len(), 1);
    }

    #[tokio::test]
    async fn recording_client_can_be_told_to_fail() {
        let client = RecordingIngestionClient::new();
        client.fail_next(1);
        let mut builder = EventBuilder::new("agent-1", "session-1");
        let event = builder.build(BuildParams::new("test")).unwrap();

        assert!(client.send_batch(&[event.clone()]).await.is_err());
        assert!(client.send_batch(&[event]).await.is_ok());
    }
}
