//! Transport and lifecycle errors for the Facto client. Record-time
//! errors from `facto-core` propagate
//! through [`Error::Core`]; everything below it is specific to batching,
//! sending, and shutting a client down.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] facto_core::Error),

    /// The ingestion collaborator could not be reached at all.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The ingestion collaborator responded, but not with 202 Accepted.
    #[error("batch rejected with status {status}: {body}")]
    SendRejected { status: u16, body: String },

    /// A send did not complete within its per-batch deadline.
    #[error("send timed out after {0:?}")]
    SendTimeout(std::time::Duration),

    /// Retries were exhausted; the batch was dropped.
    #[error("batch of {count} events dropped after {attempts} attempts: {last_error}")]
    BatchDropped {
        count: usize,
        attempts: u32,
        last_error: String,
    },

    /// A `record`/`scoped`/`wrap` call was made after `close()`.
    #[error("client is closed")]
    Closed,

    /// `close(timeout)` elapsed with a batch still in flight.
    #[error("close timed out after {0:?} with {1} events unflushed")]
    CloseTimeout(std::time::Duration, usize),
}

pub type Result<T> = std::result::Result<T, Error>;
