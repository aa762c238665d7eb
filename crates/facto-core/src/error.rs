//! Error taxonomy for canonicalization, hashing, signing and chain operations.

use thiserror::Error;

/// Errors raised while building, canonicalizing or signing a [`crate::event::FactoEvent`].
#[derive(Debug, Error)]
pub enum Error {
    /// `completed_at` was earlier than `started_at`.
    #[error("invalid timestamps: completed_at ({completed_at}) precedes started_at ({started_at})")]
    InvalidTimestamps { started_at: i64, completed_at: i64 },

    /// `status` did not match one of the recognized values.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// A key did not have the expected raw byte length.
    #[error("malformed key: expected {expected} bytes, got {got}")]
    MalformedKey { expected: usize, got: usize },

    /// A signature did not have the expected raw byte length.
    #[error("malformed signature: expected {expected} bytes, got {got}")]
    MalformedSignature { expected: usize, got: usize },

    /// A value could not be represented in the canonical JSON form.
    #[error("value is not canonical-JSON representable: {0}")]
    Canonicalization(String),

    /// Ed25519 signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// An `append` was attempted whose `prev_hash` does not match the
    /// session chain's current tip.
    #[error("chain broken: expected prev_hash {expected}, got {got}")]
    ChainBroken { expected: String, got: String },
}

pub type Result<T> = std::result::Result<T, Error>;
