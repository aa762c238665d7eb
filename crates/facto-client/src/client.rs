//! `FactoClient`: ties one `facto_core::EventBuilder` per session to the
//! [`crate::batcher::Batcher`] and owns the single background flush task.
//!
//! One `tokio::task` per client instance, spawned on construction and
//! torn down by a `tokio::sync::oneshot` shutdown signal on `close`.

use crate::batcher::Batcher;
use crate::config::FactoConfig;
use crate::error::{Error, Result};
use crate::recorder::{ScopedRecording, Wrapped};
use facto_core::builder::{BuildParams, EventBuilder};
use facto_core::{ExecutionMeta, Signer, Status};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};

use crate::transport::{HttpIngestionClient, IngestionClient};

struct Inner {
    agent_id: String,
    /// One builder (and therefore one chain) per `session_id`. A client
    /// may record into more than one session; each session serializes
    /// independently as its own chain.
    builders: Mutex<HashMap<String, EventBuilder>>,
    batcher: Arc<Batcher>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    flush_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

/// The application-facing Facto SDK handle.
///
/// Owns exactly one signing key, never shared across clients, via the
/// [`EventBuilder`]s it creates, and exactly one
/// background flusher (`facto-client::batcher::Batcher::run_flush_loop`).
/// Cloning a `FactoClient` is cheap and shares the same chain locks,
/// buffer and flush task — an `Arc`-handle-to-shared-state shape.
#[derive(Clone)]
pub struct FactoClient {
    inner: Arc<Inner>,
    config: FactoConfig,
}

impl FactoClient {
    /// Build a client against the `reqwest`-backed default transport.
    pub fn new(config: FactoConfig) -> Self {
        let transport = Arc::new(HttpIngestionClient::new(config.endpoint.clone()));
        Self::with_transport(config, transport)
    }

    /// Build a client against a caller-supplied [`IngestionClient`] — the
    /// seam tests use to substitute `RecordingIngestionClient`.
    pub fn with_transport(config: FactoConfig, transport: Arc<dyn IngestionClient>) -> Self {
        let batcher = Arc::new(Batcher::new(transport, &config));
        let (tx, rx) = oneshot::channel();
        let flush_task = tokio::spawn(batcher.clone().run_flush_loop(rx));

        Self {
            inner: Arc::new(Inner {
                agent_id: config.agent_id.clone(),
                builders: Mutex::new(HashMap::new()),
                batcher,
                shutdown: Mutex::new(Some(tx)),
                flush_task: Mutex::new(Some(flush_task)),
            }),
            config,
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.inner.agent_id
    }

    /// The `session_id` this client was configured with. `record`/`scoped`/
    /// `wrap` always record into this session.
    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    async fn builder_for(&self, session_id: &str) -> Result<()> {
        let mut builders = self.inner.builders.lock().await;
        if !builders.contains_key(session_id) {
            let signer = match &self.config.signing_key {
                Some(bytes) => facto_core::sign::Signer::from_bytes(bytes)?,
                None => Signer::generate(),
            };
            builders.insert(
                session_id.to_string(),
                EventBuilder::with_signer(self.inner.agent_id.clone(), session_id.to_string(), signer),
            );
        }
        Ok(())
    }

    /// Build, sign, chain and enqueue one event into `session_id`.
    async fn build_and_enqueue(&self, session_id: &str, params: BuildParams) -> Result<String> {
        self.builder_for(session_id).await?;
        let event = {
            let mut builders = self.inner.builders.lock().await;
            let builder = builders
                .get_mut(session_id)
                .expect("builder_for just inserted this session's builder");
            builder.build(params)?
        };
        let facto_id = event.facto_id.clone();
        self.inner.batcher.enqueue(event).await?;
        Ok(facto_id)
    }

    /// **Explicit** recorder: synchronous, returns after signing
    /// and enqueue.
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        &self,
        action_type: impl Into<String>,
        input_data: serde_json::Value,
        output_data: serde_json::Value,
        execution_meta: ExecutionMeta,
        status: Status,
    ) -> Result<String> {
        self.build_and_enqueue(
            &self.config.session_id.clone(),
            BuildParams {
                action_type: action_type.into(),
                input_data,
                output_data,
                execution_meta,
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    /// **Scoped block** recorder: returns an RAII guard whose
    /// `output`/`meta` fields the caller fills in before it drops (or
    /// before it is told to `fail`). The guard builds and enqueues exactly
    /// once, on every exit path, including unwind.
    pub fn scoped(&self, action_type: impl Into<String>, input_data: serde_json::Value) -> ScopedRecording {
        ScopedRecording::new(self.clone(), action_type.into(), input_data)
    }

    /// **Wrapped callable** recorder: wraps a fallible closure so
    /// every invocation is recorded with the closure's argument as
    /// `input_data` and its `Ok`/`Err` as `output_data`/`output_data.error`.
    pub fn wrap<F, A, T, E>(&self, action_type: impl Into<String>, f: F) -> Wrapped<F, A, T, E>
    where
        F: Fn(A) -> std::result::Result<T, E>,
        A: serde::Serialize,
        T: serde::Serialize,
        E: std::fmt::Display,
    {
        Wrapped::new(self.clone(), action_type.into(), f)
    }

    pub(crate) async fn enqueue(&self, session_id: &str, params: BuildParams) -> Result<String> {
        self.build_and_enqueue(session_id, params).await
    }

    /// Force-send whatever is currently buffered, outside the normal
    /// size/time triggers.
    pub async fn flush(&self) -> Result<usize> {
        self.inner.batcher.flush().await
    }

    /// Mandatory final flush, idempotent: a second `close`
    /// call is a no-op returning `Ok(0)`, not an error.
    pub async fn close(&self, timeout: Duration) -> Result<usize> {
        let shutdown = self.inner.shutdown.lock().await.take();
        if shutdown.is_none() {
            // Already closed; idempotent no-op.
            return Ok(0);
        }
        self.inner.batcher.mark_closed();
        let _ = shutdown.expect("checked above").send(());

        if let Some(task) = self.inner.flush_task.lock().await.take() {
            let _ = task.await;
        }

        match tokio::time::timeout(timeout, self.inner.batcher.flush()).await {
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                let dropped = self.inner.batcher.drain_and_drop().await;
                Err(Error::CloseTimeout(timeout, dropped))
            }
        }
    }
}
