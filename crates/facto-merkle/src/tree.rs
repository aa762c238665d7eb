//! The Merkle Engine.
//!
//! Builds a binary Merkle tree over a session slice — the `event_hash`
//! values of a contiguous, chain-ordered run of events — and emits
//! logarithmic-length inclusion proofs against the tree's root.
//!
//! A bottom-up, move-semantics tree build over SHA3-256 leaves, kept in
//! a level-indexed representation so it can also emit a proof, not just
//! answer `contains`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

/// Which side of the current accumulator a proof step's sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

/// One step of an inclusion proof: a sibling hash and which side it folds in from.
///
/// `hash` is always 64 lowercase hex characters, matching the wire
/// representation in an evidence bundle's `merkle_proofs[].proof[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofStep {
    pub hash: String,
    pub side: Side,
}

/// `parent = SHA3-256(left || right)` over raw 32-byte hashes, not their hex form.
pub fn combine(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(left);
    hasher.update(right);
    let out = hasher.finalize();
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&out);
    buf
}

/// Parse 64 lowercase hex characters into raw bytes. `None` on any
/// malformed input (wrong length, non-hex, uppercase) rather than a panic,
/// since a verifier must treat a malformed proof hash as "does not
/// verify", not a crash.
pub fn hash_from_hex(s: &str) -> Option<[u8; 32]> {
    if s.len() != 64 || !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
        return None;
    }
    let bytes = hex::decode(s).ok()?;
    bytes.try_into().ok()
}

/// A binary Merkle tree built bottom-up from leaf hashes.
///
/// Odd-width levels duplicate the final node (standard Bitcoin-style
/// padding) rather than promoting it unpaired, so every internal node has
/// exactly two children and the proof format never needs a "no sibling"
/// case.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// `levels[0]` is the leaves; `levels.last()` is `[root]`.
    levels: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    /// Build a tree from raw 32-byte leaf hashes, in session-chain order.
    pub fn from_leaf_hashes(leaves: Vec<[u8; 32]>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(Error::EmptyTree);
        }
        let mut levels = vec![leaves];
        while levels.last().expect("levels is never empty").len() > 1 {
            let cur = levels.last().expect("levels is never empty");
            let mut next = Vec::with_capacity(cur.len().div_ceil(2));
            let mut i = 0;
            while i < cur.len() {
                let left = cur[i];
                let right = *cur.get(i + 1).unwrap_or(&left);
                next.push(combine(&left, &right));
                i += 2;
            }
            levels.push(next);
        }
        Ok(Self { levels })
    }

    /// Build a tree from the hex `event_hash` values of a session slice,
    /// in chain order.
    pub fn from_event_hashes<S: AsRef<str>>(event_hashes: &[S]) -> Result<Self> {
        let leaves = event_hashes
            .iter()
            .map(|h| {
                let s = h.as_ref();
                hash_from_hex(s).ok_or_else(|| Error::InvalidLeafHash(s.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_leaf_hashes(leaves)
    }

    /// Number of leaves the tree was built from.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// The 32 raw root bytes.
    pub fn root(&self) -> [u8; 32] {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .expect("a tree built from at least one leaf always has a root")
    }

    /// The root, lowercase hex encoded — what travels on the wire.
    pub fn root_hex(&self) -> String {
        hex::encode(self.root())
    }

    /// Build the inclusion proof for the leaf at `index` (0-based, in the
    /// same order the tree was built from).
    pub fn prove(&self, index: usize) -> Result<Vec<ProofStep>> {
        if index >= self.leaf_count() {
            return Err(Error::LeafOutOfRange {
                index,
                len: self.leaf_count(),
            });
        }

        let mut steps = Vec::with_capacity(self.levels.len() - 1);
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let (sibling_idx, side) = if idx % 2 == 0 {
                (idx + 1, Side::Right)
            } else {
                (idx - 1, Side::Left)
            };
            let sibling = *level.get(sibling_idx).unwrap_or(&level[idx]);
            steps.push(ProofStep {
                hash: hex::encode(sibling),
                side,
            });
            idx /= 2;
        }
        Ok(steps)
    }
}

/// Fold a leaf hash up through a proof, returning the resulting root bytes.
fn fold(leaf: [u8; 32], proof: &[ProofStep]) -> Option<[u8; 32]> {
    let mut acc = leaf;
    for step in proof {
        let sibling = hash_from_hex(&step.hash)?;
        acc = match step.side {
            Side::Left => combine(&sibling, &acc),
            Side::Right => combine(&acc, &sibling),
        };
    }
    Some(acc)
}

/// Verify that `leaf_hash_hex` is included, via `proof`, under `root_hex`.
///
/// Returns `false` (never panics or errors) for any malformed hex in the
/// leaf, a proof step, or the root — malformed input is simply a proof
/// that does not verify.
pub fn verify_inclusion(leaf_hash_hex: &str, proof: &[ProofStep], root_hex: &str) -> bool {
    let Some(leaf) = hash_from_hex(leaf_hash_hex) else {
        return false;
    };
    let Some(root) = hash_from_hex(root_hex) else {
        return false;
    };
    fold(leaf, proof) == Some(root)
}
