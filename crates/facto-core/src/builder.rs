//! The Event Builder.
//!
//! Ties the canonicalizer, hasher and signer to one session's chain state:
//! given the caller's inputs, it assigns a `facto_id`, fills in timestamp
//! and status defaults, stamps `proof.prev_hash` from the chain, computes
//! the canonical bytes exactly once, hashes and signs them, and finally
//! commits the freshly-built event to the chain.

use crate::canon::canonical_bytes;
use crate::chain::SessionChain;
use crate::error::{Error, Result};
use crate::event::{ExecutionMeta, FactoEvent, Proof, Status};
use crate::hash::hex_digest;
use crate::sign::Signer;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Caller-supplied inputs for one event. Anything left `None`/default is
/// filled in by [`EventBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct BuildParams {
    pub action_type: String,
    pub input_data: serde_json::Value,
    pub output_data: serde_json::Value,
    pub execution_meta: ExecutionMeta,
    pub parent_facto_id: Option<String>,
    pub status: Option<Status>,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
}

impl BuildParams {
    /// A minimal builder for the common case: just an action type.
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            ..Default::default()
        }
    }
}

fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_nanos() as i64
}

/// Builds and chains events for exactly one `(agent_id, session_id)` pair.
///
/// Not `Sync` by itself — `facto-client` wraps one of these per session
/// behind a `tokio::sync::Mutex` so concurrent recorders serialize on
/// append, which is what keeps the hash chain and sequence counter
/// consistent under concurrency.
pub struct EventBuilder {
    agent_id: String,
    session_id: String,
    signer: Signer,
    chain: SessionChain,
}

impl EventBuilder {
    /// Start a fresh session with a freshly generated signing key.
    pub fn new(agent_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self::with_signer(agent_id, session_id, Signer::generate())
    }

    /// Start a fresh session with a caller-supplied signing key.
    pub fn with_signer(
        agent_id: impl Into<String>,
        session_id: impl Into<String>,
        signer: Signer,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            session_id: session_id.into(),
            signer,
            chain: SessionChain::new(),
        }
    }

    /// Resume a session whose chain tip is already known (e.g. after a
    /// process restart). The signing key must be the same one used
    /// before — a session's events must all verify against one key.
    pub fn resume(
        agent_id: impl Into<String>,
        session_id: impl Into<String>,
        signer: Signer,
        last_hash: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            session_id: session_id.into(),
            signer,
            chain: SessionChain::resume(last_hash),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The verifying key this builder signs with, base64-encoded.
    pub fn public_key_base64(&self) -> String {
        self.signer.public_key_base64()
    }

    /// Build, hash, sign and chain one event.
    pub fn build(&mut self, params: BuildParams) -> Result<FactoEvent> {
        let started_at = params.started_at.unwrap_or_else(now_ns);
        let completed_at = params.completed_at.unwrap_or_else(now_ns);
        if completed_at < started_at {
            return Err(Error::InvalidTimestamps {
                started_at,
                completed_at,
            });
        }

        let facto_id = format!("ft-{}", Uuid::new_v4());
        let prev_hash = self.chain.tip();

        let mut event = FactoEvent {
            facto_id,
            agent_id: self.agent_id.clone(),
            session_id: self.session_id.clone(),
            parent_facto_id: params.parent_facto_id,
            action_type: params.action_type,
            status: params.status.unwrap_or_default(),
            input_data: params.input_data,
            output_data: params.output_data,
            execution_meta: params.execution_meta,
            started_at,
            completed_at,
            proof: Proof {
                prev_hash,
                event_hash: String::new(),
                signature: String::new(),
                public_key: self.signer.public_key_base64(),
                alg: None,
            },
        };

        let canonical = canonical_bytes(&event)?;
        event.proof.event_hash = hex_digest(&canonical);
        event.proof.signature = self.signer.sign(&canonical)?;

        self.chain.append(&event)?;
        Ok(event)
    }
}
