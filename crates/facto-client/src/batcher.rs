//! The Batcher.
//!
//! A bounded buffer flushed on size, age, explicit `flush()`, or
//! `close()`. Cooperative single-flusher:
//! the background loop spawned by [`crate::client::FactoClient`] is the
//! only task that ever drains the buffer, so there is never more than
//! one in-flight batch send. Backpressure to callers is a
//! `tokio::sync::Semaphore` sized to the hard cap — a permit-gate bound
//! on buffered-but-unsent events rather than in-flight jobs.

use crate::config::{FactoConfig, DEFAULT_HARD_CAP};
use crate::error::{Error, Result};
use crate::transport::IngestionClient;
use facto_core::FactoEvent;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, Semaphore};

/// Retry backoff for a failed batch send. Exponential with a cap.
#[derive(Debug, Clone, Copy)]
pub struct BackoffStrategy {
    pub initial: Duration,
    pub multiplier: f64,
    pub max: Duration,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(200),
            multiplier: 2.0,
            max: Duration::from_secs(30),
        }
    }
}

impl BackoffStrategy {
    pub fn delay(&self, attempt: u32) -> Duration {
        let secs = self.initial.as_secs_f64() * self.multiplier.powi(attempt as i32 - 1);
        Duration::from_secs_f64(secs.min(self.max.as_secs_f64()))
    }
}

/// How many times a batch send is attempted before the batch is dropped
/// (escalated to `Error::BatchDropped`).
const MAX_SEND_ATTEMPTS: u32 = 5;

/// Per-attempt deadline for a single `send_batch` call. A send that hangs
/// past this is treated exactly like any other transport failure — it
/// counts against `MAX_SEND_ATTEMPTS` and is retried with backoff, never
/// left to block the single flusher indefinitely.
const DEFAULT_SEND_DEADLINE: Duration = Duration::from_secs(30);

struct Inner {
    client: Arc<dyn IngestionClient>,
    buffer: Mutex<VecDeque<FactoEvent>>,
    slots: Semaphore,
    batch_size: usize,
    flush_interval: Duration,
    flush_notify: Notify,
    closed: AtomicBool,
    backoff: BackoffStrategy,
    send_deadline: Duration,
}

/// The size/time-triggered send buffer sitting between [`crate::client::FactoClient`]
/// and an [`IngestionClient`].
pub struct Batcher {
    inner: Arc<Inner>,
}

impl Batcher {
    pub fn new(client: Arc<dyn IngestionClient>, config: &FactoConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                buffer: Mutex::new(VecDeque::new()),
                slots: Semaphore::new(DEFAULT_HARD_CAP),
                batch_size: config.batch_size.max(1),
                flush_interval: config.flush_interval,
                flush_notify: Notify::new(),
                closed: AtomicBool::new(false),
                backoff: BackoffStrategy::default(),
                send_deadline: DEFAULT_SEND_DEADLINE,
            }),
        }
    }

    /// Enqueue one event. Suspends on the hard-cap semaphore if the
    /// buffer is already full — backpressure to the caller.
    pub async fn enqueue(&self, event: FactoEvent) -> Result<()> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        let permit = self
            .inner
            .slots
            .acquire()
            .await
            .expect("Batcher semaphore is never closed while the batcher itself is open");
        permit.forget();

        let len = {
            let mut buffer = self.inner.buffer.lock().await;
            buffer.push_back(event);
            buffer.len()
        };
        if len >= self.inner.batch_size {
            self.inner.flush_notify.notify_one();
        }
        Ok(())
    }

    /// Drain and send whatever is currently buffered. A no-op returning
    /// `Ok(0)` if the buffer is empty — `close()` relies on this to make
    /// its final flush idempotent.
    pub async fn flush(&self) -> Result<usize> {
        let batch: Vec<FactoEvent> = {
            let mut buffer = self.inner.buffer.lock().await;
            buffer.drain(..).collect()
        };
        if batch.is_empty() {
            return Ok(0);
        }
        let n = batch.len();
        let result = self.send_with_retry(&batch).await;
        self.inner.slots.add_permits(n);
        result.map(|_| n)
    }

    async fn send_with_retry(&self, batch: &[FactoEvent]) -> Result<()> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let outcome = match tokio::time::timeout(
                self.inner.send_deadline,
                self.inner.client.send_batch(batch),
            )
            .await
            {
                Ok(result) => result.map(|_| ()),
                Err(_elapsed) => Err(Error::SendTimeout(self.inner.send_deadline)),
            };
            match outcome {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= MAX_SEND_ATTEMPTS => {
                    tracing::error!(attempts = attempt, error = %e, "batch dropped after exhausting retries");
                    return Err(Error::BatchDropped {
                        count: batch.len(),
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => {
                    let delay = self.inner.backoff.delay(attempt);
                    tracing::warn!(attempt, delay = ?delay, error = %e, "batch send failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Run the size/time-triggered flush loop until `shutdown` fires,
    /// then perform one final mandatory flush. Spawned once per client
    /// by [`crate::client::FactoClient::new`] as the single background
    /// worker for that client instance.
    pub async fn run_flush_loop(self: Arc<Self>, mut shutdown: tokio::sync::oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.inner.flush_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.flush().await {
                        tracing::warn!(error = %e, "scheduled flush failed");
                    }
                }
                _ = self.inner.flush_notify.notified() => {
                    if let Err(e) = self.flush().await {
                        tracing::warn!(error = %e, "size-triggered flush failed");
                    }
                }
                _ = &mut shutdown => {
                    break;
                }
            }
        }
    }

    /// Number of events currently buffered (not yet handed to a send).
    pub async fn buffered_len(&self) -> usize {
        self.inner.buffer.lock().await.len()
    }

    pub fn mark_closed(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    /// Drop everything still buffered without attempting to send it —
    /// used only when `close(timeout)` elapses. Returns the drop count.
    pub async fn drain_and_drop(&self) -> usize {
        let mut buffer = self.inner.buffer.lock().await;
        let n = buffer.len();
        buffer.clear();
        self.inner.slots.add_permits(n);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingIngestionClient;
    use facto_core::builder::{BuildParams, EventBuilder};

    fn config(batch_size: usize) -> FactoConfig {
        FactoConfig {
            batch_size,
            flush_interval: Duration::from_secs(3600),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn flush_is_a_no_op_on_an_empty_buffer() {
        let recorder = Arc::new(RecordingIngestionClient::new());
        let batcher = Batcher::new(recorder.clone(), &config(10));
        assert_eq!(batcher.flush().await.unwrap(), 0);
        assert_eq!(recorder.batch_count(), 0);
    }

    #[tokio::test]
    async fn explicit_flush_sends_everything_buffered() {
        let recorder = Arc::new(RecordingIngestionClient::new());
        let batcher = Batcher::new(recorder.clone(), &config(10));
        let mut builder = EventBuilder::new("agent-1", "session-1");
        for i in 0..3 {
            let event = builder.build(BuildParams::new(format!("action-{i}"))).unwrap();
            batcher.enqueue(event).await.unwrap();
        }
        assert_eq!(batcher.buffered_len().await, 3);
        let flushed = batcher.flush().await.unwrap();
        assert_eq!(flushed, 3);
        assert_eq!(recorder.received_events().len(), 3);
        assert_eq!(batcher.buffered_len().await, 0);
    }

    #[tokio::test]
    async fn batch_size_of_one_flushes_after_every_record() {
        let recorder = Arc::new(RecordingIngestionClient::new());
        let batcher = Arc::new(Batcher::new(recorder.clone(), &config(1)));
        let (_tx, rx) = tokio::sync::oneshot::channel();
        let loop_handle = tokio::spawn(batcher.clone().run_flush_loop(rx));

        let mut builder = EventBuilder::new("agent-1", "session-1");
        let event = builder.build(BuildParams::new("solo")).unwrap();
        batcher.enqueue(event).await.unwrap();

        // Give the notified flush loop a chance to drain the one event.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(recorder.batch_count(), 1);

        loop_handle.abort();
    }

    #[tokio::test]
    async fn does_not_reorder_events_within_a_session() {
        let recorder = Arc::new(RecordingIngestionClient::new());
        let batcher = Batcher::new(recorder.clone(), &config(10));
        let mut builder = EventBuilder::new("agent-1", "session-1");
        let mut ids = Vec::new();
        for i in 0..5 {
            let event = builder.build(BuildParams::new(format!("action-{i}"))).unwrap();
            ids.push(event.facto_id.clone());
            batcher.enqueue(event).await.unwrap();
        }
        batcher.flush().await.unwrap();
        let received_ids: Vec<String> = recorder.received_events().into_iter().map(|e| e.facto_id).collect();
        assert_eq!(received_ids, ids);
    }

    #[tokio::test]
    async fn failed_send_is_retried_and_eventually_succeeds() {
        let recorder = Arc::new(RecordingIngestionClient::new());
        recorder.fail_next(2);
        let batcher = Batcher::new(recorder.clone(), &config(10));
        let mut builder = EventBuilder::new("agent-1", "session-1");
        let event = builder.build(BuildParams::new("flaky")).unwrap();
        batcher.enqueue(event).await.unwrap();

        let flushed = batcher.flush().await.unwrap();
        assert_eq!(flushed, 1);
        assert_eq!(recorder.batch_count(), 1);
    }

    #[tokio::test]
    async fn drain_and_drop_empties_the_buffer_and_reports_the_count() {
        let recorder = Arc::new(RecordingIngestionClient::new());
        let batcher = Batcher::new(recorder, &config(10));
        let mut builder = EventBuilder::new("agent-1", "session-1");
        for i in 0..4 {
            let event = builder.build(BuildParams::new(format!("action-{i}"))).unwrap();
            batcher.enqueue(event).await.unwrap();
        }
        let dropped = batcher.drain_and_drop().await;
        assert_eq!(dropped, 4);
        assert_eq!(batcher.buffered_len().await, 0);
    }
}
