//! The "Scoped block" (`scoped`) and "Wrapped callable" (`wrap`)
//! recording surfaces.
//!
//! Both delegate to `FactoClient::enqueue`, which in turn drives
//! `facto_core::EventBuilder`. The RAII shape here plays the role a
//! lock guard plays: the event is finalized (built, signed, enqueued)
//! exactly once, on every exit path, including an unwinding panic.

use crate::client::FactoClient;
use crate::error::Result;
use facto_core::builder::BuildParams;
use facto_core::{ExecutionMeta, Status};

struct PendingScope {
    client: FactoClient,
    session_id: String,
    action_type: String,
    input_data: serde_json::Value,
}

fn merge_error(output: &mut serde_json::Value, description: &str) {
    if !output.is_object() {
        *output = serde_json::json!({});
    }
    output
        .as_object_mut()
        .expect("just ensured this is an object")
        .insert("error".to_string(), serde_json::Value::String(description.to_string()));
}

async fn finalize(
    pending: PendingScope,
    output_data: serde_json::Value,
    meta: ExecutionMeta,
    status: Status,
) -> Result<String> {
    pending
        .client
        .enqueue(
            &pending.session_id,
            BuildParams {
                action_type: pending.action_type,
                input_data: pending.input_data,
                output_data,
                execution_meta: meta,
                status: Some(status),
                ..Default::default()
            },
        )
        .await
}

/// An in-progress scoped recording.
///
/// `output` and `meta` are plain public fields the caller fills in while
/// the guard is open. On [`ScopedRecording::finish`] (or an ordinary
/// drop) the event is built with `status = success`; on
/// [`ScopedRecording::fail`] (or a drop during an unwinding panic) it is
/// built with `status = failure` and `output_data.error` set to the
/// failure's description.
pub struct ScopedRecording {
    pending: Option<PendingScope>,
    pub output: serde_json::Value,
    pub meta: ExecutionMeta,
}

impl ScopedRecording {
    pub(crate) fn new(client: FactoClient, action_type: String, input_data: serde_json::Value) -> Self {
        let session_id = client.session_id().to_string();
        Self {
            pending: Some(PendingScope {
                client,
                session_id,
                action_type,
                input_data,
            }),
            output: serde_json::Value::Null,
            meta: ExecutionMeta::default(),
        }
    }

    /// Finalize with `status = success`, using `output`/`meta` as they
    /// stand at the call site. Disarms the `Drop` impl.
    pub async fn finish(mut self) -> Result<String> {
        let pending = self.pending.take().expect("a freshly constructed guard always has a pending scope");
        let output = std::mem::replace(&mut self.output, serde_json::Value::Null);
        let meta = std::mem::take(&mut self.meta);
        finalize(pending, output, meta, Status::Success).await
    }

    /// Finalize with `status = failure`, recording `error`'s `Display`
    /// form into `output_data.error`, then hand `error` straight back so
    /// the caller can re-propagate it unchanged. A failure to enqueue
    /// the recording itself is
    /// logged, not propagated — it must never mask the original error.
    pub async fn fail<E: std::fmt::Display>(mut self, error: E) -> E {
        let pending = self.pending.take().expect("a freshly constructed guard always has a pending scope");
        let mut output = std::mem::replace(&mut self.output, serde_json::Value::Null);
        let meta = std::mem::take(&mut self.meta);
        let description = error.to_string();
        merge_error(&mut output, &description);
        if let Err(e) = finalize(pending, output, meta, Status::Failure).await {
            tracing::warn!(error = %e, "failed to record a scoped block's failure");
        }
        error
    }
}

impl Drop for ScopedRecording {
    /// Best-effort finalization for a guard that was never explicitly
    /// `finish`ed or `fail`ed — e.g. an early `return` out of the block
    /// that held it, or an unwinding panic. `Drop` cannot `.await`, so
    /// the final build-and-enqueue is spawned onto the runtime rather
    /// than performed inline; callers who need the resulting `facto_id`
    /// or need enqueue errors surfaced should call `finish`/`fail`
    /// explicitly instead of relying on this path.
    fn drop(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let mut output = std::mem::replace(&mut self.output, serde_json::Value::Null);
        let meta = std::mem::take(&mut self.meta);
        let status = if std::thread::panicking() {
            merge_error(&mut output, "scope dropped while unwinding");
            Status::Failure
        } else {
            Status::Success
        };
        tokio::spawn(async move {
            if let Err(e) = finalize(pending, output, meta, status).await {
                tracing::warn!(error = %e, "scoped recording failed to finalize on drop");
            }
        });
    }
}

/// Wraps a fallible closure so each invocation is recorded: the
/// argument becomes `input_data`, `Ok` becomes
/// `output_data`, `Err` is captured into `output_data.error` exactly as
/// the scoped block does, and the closure's own result is always handed
/// back unchanged.
pub struct Wrapped<F, A, T, E> {
    client: FactoClient,
    action_type: String,
    meta: ExecutionMeta,
    f: F,
    _marker: std::marker::PhantomData<fn(A) -> std::result::Result<T, E>>,
}

impl<F, A, T, E> Wrapped<F, A, T, E>
where
    F: Fn(A) -> std::result::Result<T, E>,
    A: serde::Serialize,
    T: serde::Serialize,
    E: std::fmt::Display,
{
    pub(crate) fn new(client: FactoClient, action_type: String, f: F) -> Self {
        Self {
            client,
            action_type,
            meta: ExecutionMeta::default(),
            f,
            _marker: std::marker::PhantomData,
        }
    }

    /// Attach `execution_meta` recorded with every invocation.
    pub fn with_meta(mut self, meta: ExecutionMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Invoke the wrapped closure, recording the call whether it succeeds
    /// or fails, then return the closure's own result unchanged. A
    /// failure to enqueue the recording is logged, never substituted for
    /// the closure's own result.
    pub async fn call(&self, arg: A) -> std::result::Result<T, E> {
        let input_data = serde_json::to_value(&arg).unwrap_or(serde_json::Value::Null);
        let result = (self.f)(arg);
        let (output_data, status) = match &result {
            Ok(value) => (
                serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
                Status::Success,
            ),
            Err(e) => {
                let mut output = serde_json::json!({});
                merge_error(&mut output, &e.to_string());
                (output, Status::Failure)
            }
        };

        let session_id = self.client.session_id().to_string();
        if let Err(e) = self
            .client
            .enqueue(
                &session_id,
                BuildParams {
                    action_type: self.action_type.clone(),
                    input_data,
                    output_data,
                    execution_meta: self.meta.clone(),
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await
        {
            tracing::warn!(error = %e, "wrapped callable failed to record its invocation");
        }
        result
    }
}
