//! The Session Chain.
//!
//! Per `session_id`, a two-state machine (`Empty` / `Extended`). The only
//! transition is `append`, which requires the event's `proof.prev_hash` to
//! equal the chain's current tip. The chain is strictly append-only:
//! there is no operation that moves `last_hash` backward.

use crate::error::{Error, Result};
use crate::event::{zero_hash, FactoEvent};

/// The tip of a per-session hash chain.
#[derive(Debug, Clone, PartialEq)]
enum ChainState {
    Empty,
    Extended { last_hash: String },
}

/// Owns the append-only chain state for one session.
///
/// Exclusively owned by the session's recorder path; concurrent writers
/// need external mutual exclusion (`facto-client` guards one instance of
/// this per session behind a `tokio::sync::Mutex`).
#[derive(Debug, Clone)]
pub struct SessionChain {
    state: ChainState,
}

impl SessionChain {
    /// A chain with no events yet appended.
    pub fn new() -> Self {
        Self {
            state: ChainState::Empty,
        }
    }

    /// Reconstruct a chain whose tip is already known (e.g. resuming a
    /// session after a process restart, with the last `event_hash` read
    /// back from storage).
    pub fn resume(last_hash: impl Into<String>) -> Self {
        Self {
            state: ChainState::Extended {
                last_hash: last_hash.into(),
            },
        }
    }

    /// The `prev_hash` the next event in this session must carry.
    pub fn tip(&self) -> String {
        match &self.state {
            ChainState::Empty => zero_hash(),
            ChainState::Extended { last_hash } => last_hash.clone(),
        }
    }

    /// Append `event` to the chain.
    ///
    /// Fails if `event.proof.prev_hash` does not match the current tip —
    /// this is the only place `prev_hash` linkage is enforced on the
    /// write path; the read path re-derives and checks it independently
    /// in `facto-verify`.
    pub fn append(&mut self, event: &FactoEvent) -> Result<()> {
        let expected = self.tip();
        if event.proof.prev_hash != expected {
            return Err(Error::ChainBroken {
                expected,
                got: event.proof.prev_hash.clone(),
            });
        }
        self.state = ChainState::Extended {
            last_hash: event.proof.event_hash.clone(),
        };
        Ok(())
    }
}

impl Default for SessionChain {
    fn default() -> Self {
        Self::new()
    }
}
