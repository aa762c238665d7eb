//! Canonical form, hashing, signing, event building and session chaining
//! for Facto audit events.
//!
//! This crate implements the cryptographic core of one audit event:
//! - [`canon`] fixes the canonical byte form (C1)
//! - [`hash`] fixes the digest algorithm (C2)
//! - [`sign`] fixes the signature scheme (C3)
//! - [`builder`] ties those three to one session's state to produce events (C4)
//! - [`chain`] enforces the per-session append-only hash chain (C5)
//!
//! Merkle batching, transport and verification live in `facto-merkle`,
//! `facto-client` and `facto-verify` respectively — this crate has no
//! network or I/O dependencies beyond what `serde`/`serde_json` need.

pub mod builder;
pub mod canon;
pub mod chain;
pub mod error;
pub mod event;
pub mod hash;
pub mod sign;

pub use builder::{BuildParams, EventBuilder};
pub use chain::SessionChain;
pub use error::{Error, Result};
pub use event::{zero_hash, ExecutionMeta, FactoEvent, Proof, Status};
pub use sign::Signer;
