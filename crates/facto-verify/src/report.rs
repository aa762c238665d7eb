//! The verifier's output: a full forensic report, not a single pass/fail.
//!
//! Every check in [`crate::verifier::verify_evidence_bundle`] is accumulated
//! here rather than short-circuiting on the first failure, so a bundle with
//! ten tampered events still reports all ten instead of stopping at the
//! first.

use serde::Serialize;

/// Per-event hash and signature verdict.
#[derive(Debug, Clone, Serialize)]
pub struct EventVerdict {
    pub facto_id: String,
    pub session_id: String,
    pub hash_valid: bool,
    pub sig_valid: bool,
}

/// Per-session chain verdict.
#[derive(Debug, Clone, Serialize)]
pub struct ChainVerdict {
    pub session_id: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Per-proof Merkle verdict.
#[derive(Debug, Clone, Serialize)]
pub struct MerkleVerdict {
    pub facto_id: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The complete verification report for one evidence bundle.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub events: Vec<EventVerdict>,
    pub chains: Vec<ChainVerdict>,
    pub merkle: Vec<MerkleVerdict>,
    /// Only populated when [`crate::verifier::VerifyOptions::strict`] is set:
    /// `facto_id`s of events with no corresponding Merkle proof.
    pub missing_merkle_coverage: Vec<String>,
    pub is_valid: bool,
}

impl VerificationReport {
    pub fn hashes_valid(&self) -> usize {
        self.events.iter().filter(|e| e.hash_valid).count()
    }

    pub fn hashes_invalid(&self) -> usize {
        self.events.iter().filter(|e| !e.hash_valid).count()
    }

    pub fn signatures_valid(&self) -> usize {
        self.events.iter().filter(|e| e.sig_valid).count()
    }

    pub fn signatures_invalid(&self) -> usize {
        self.events.iter().filter(|e| !e.sig_valid).count()
    }

    pub fn chains_valid(&self) -> usize {
        self.chains.iter().filter(|c| c.valid).count()
    }

    pub fn chains_invalid(&self) -> usize {
        self.chains.iter().filter(|c| !c.valid).count()
    }

    pub fn merkle_valid(&self) -> usize {
        self.merkle.iter().filter(|m| m.valid).count()
    }

    pub fn merkle_total(&self) -> usize {
        self.merkle.len()
    }
}
