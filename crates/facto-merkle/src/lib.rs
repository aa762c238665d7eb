//! The Merkle Engine.
//!
//! Builds a binary SHA3-256 Merkle tree over a session slice (a
//! contiguous, chain-ordered run of `event_hash` values) and produces
//! logarithmic-length inclusion proofs against its root. `facto-verify`
//! re-derives and checks these proofs without trusting whoever built the
//! tree; a hypothetical server-side shard-materializer (out of scope of
//! this repository per the protocol's non-goals) would call the same
//! `MerkleTree` this crate exposes.

pub mod error;
pub mod tree;

pub use error::{Error, Result};
pub use tree::{combine, hash_from_hex, verify_inclusion, MerkleTree, ProofStep, Side};
