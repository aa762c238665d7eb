//! The evidence-bundle wire format: an ordered sequence of events for
//! one or more sessions, plus an optional Merkle proof per event.

use crate::error::Result;
use facto_core::FactoEvent;
use facto_merkle::ProofStep;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One Merkle inclusion proof, binding an `event_hash` to a `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleProofEntry {
    pub facto_id: String,
    pub event_hash: String,
    pub root: String,
    pub proof: Vec<ProofStep>,
}

/// The verifier's sole input: everything needed to reconstruct and check
/// every hash, signature, chain link and Merkle proof without trusting
/// whoever produced the bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub events: Vec<FactoEvent>,
    #[serde(default)]
    pub merkle_proofs: Vec<MerkleProofEntry>,
}

impl EvidenceBundle {
    /// Parse a bundle from a JSON string.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read and parse a bundle from a file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merkle_proofs_default_to_empty_when_absent() {
        let bundle = EvidenceBundle::from_json(r#"{"events": []}"#).unwrap();
        assert!(bundle.merkle_proofs.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(EvidenceBundle::from_json("not json").is_err());
    }
}
