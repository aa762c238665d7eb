//! Errors raised parsing an evidence bundle. Integrity failures discovered
//! *while* verifying a well-formed bundle are never `Err` — they are data,
//! accumulated into a [`crate::report::VerificationReport`] so one bundle
//! read produces a full forensic report instead of failing fast.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("evidence bundle is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read bundle from disk: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
