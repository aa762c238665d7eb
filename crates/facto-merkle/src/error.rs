//! Error taxonomy for Merkle tree construction and proof generation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A tree was built from zero leaves.
    #[error("cannot build a Merkle tree from zero leaves")]
    EmptyTree,

    /// A proof was requested for a leaf index outside the tree.
    #[error("leaf index {index} out of range for a tree of {len} leaves")]
    LeafOutOfRange { index: usize, len: usize },

    /// A leaf hash was not 64 lowercase hex characters.
    #[error("leaf hash is not valid hex: {0}")]
    InvalidLeafHash(String),
}

pub type Result<T> = std::result::Result<T, Error>;
