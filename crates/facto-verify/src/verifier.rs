//! The Verifier.
//!
//! Replays the canonicalizer, hasher and signer (`facto_core`) and the
//! Merkle engine (`facto_merkle`) over the bytes in an [`EvidenceBundle`]
//! without trusting anything the bundle's producer claims about itself.
//! One routine per check, each returning a verdict rather than raising,
//! so a caller always gets the full picture instead of the first failure.

use crate::bundle::EvidenceBundle;
use crate::report::{ChainVerdict, EventVerdict, MerkleVerdict, VerificationReport};
use facto_core::event::zero_hash;
use facto_core::{canon, hash, sign, FactoEvent};
use facto_merkle::verify_inclusion;
use std::collections::{HashMap, HashSet};

/// Verification behavior beyond the protocol's default pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions {
    /// Additionally fail `is_valid` when any event in the bundle lacks a
    /// corresponding Merkle proof. Without this, a verifier cannot
    /// distinguish a complete bundle from one whose tail was silently
    /// dropped along with its proofs.
    pub strict: bool,
}

/// Recompute canonical bytes and hash for one event. `None` if the event
/// is not canonical-JSON representable at all.
fn recomputed_hash(event: &FactoEvent) -> Option<String> {
    canon::canonical_bytes(event)
        .ok()
        .map(|bytes| hash::hex_digest(&bytes))
}

/// Recompute canonical bytes, hash and signature for one event.
fn verify_event(event: &FactoEvent) -> EventVerdict {
    let canonical = canon::canonical_bytes(event);
    let (hash_valid, sig_valid) = match canonical {
        Ok(bytes) => {
            let recomputed_hash = hash::hex_digest(&bytes);
            let hash_valid = recomputed_hash == event.proof.event_hash;
            let sig_valid = sign::verify(&bytes, &event.proof.signature, &event.proof.public_key)
                .unwrap_or(false);
            (hash_valid, sig_valid)
        }
        Err(_) => (false, false),
    };

    EventVerdict {
        facto_id: event.facto_id.clone(),
        session_id: event.session_id.clone(),
        hash_valid,
        sig_valid,
    }
}

/// Validate one session's chain: total order by `completed_at`, ties
/// broken by `prev_hash` linkage, first event anchored to the zero hash.
///
/// Linkage is checked against each predecessor's *recomputed* hash
/// (`actual_hashes`), never its stored `proof.event_hash` — a tampered
/// event whose stored hash was left stale must still break the chain for
/// its successor, even though the tampered event's own stored hash never
/// changed.
fn verify_chain(
    session_id: &str,
    events: &[&FactoEvent],
    actual_hashes: &HashMap<&str, Option<String>>,
) -> ChainVerdict {
    let actual = |e: &FactoEvent| -> Option<&str> {
        actual_hashes
            .get(e.facto_id.as_str())
            .and_then(|h| h.as_deref())
    };

    let mut sorted: Vec<&FactoEvent> = events.to_vec();
    sorted.sort_by_key(|e| e.completed_at);

    // A completed_at tie only has one valid resolution: whichever event's
    // actual hash the other's prev_hash names goes first. Bubble those
    // pairs into place; anything left disordered after this is genuinely
    // unlinked, not just mis-sorted.
    let mut changed = true;
    while changed {
        changed = false;
        for i in 0..sorted.len().saturating_sub(1) {
            if sorted[i].completed_at == sorted[i + 1].completed_at
                && actual(sorted[i + 1]) == Some(sorted[i].proof.prev_hash.as_str())
            {
                sorted.swap(i, i + 1);
                changed = true;
            }
        }
    }

    if let Some(first) = sorted.first() {
        if first.proof.prev_hash != zero_hash() {
            return ChainVerdict {
                session_id: session_id.to_string(),
                valid: false,
                reason: Some(format!(
                    "first event {} does not chain from the zero hash",
                    first.facto_id
                )),
            };
        }
    }

    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.completed_at == b.completed_at {
            if actual(a) != Some(b.proof.prev_hash.as_str())
                && actual(b) != Some(a.proof.prev_hash.as_str())
            {
                return ChainVerdict {
                    session_id: session_id.to_string(),
                    valid: false,
                    reason: Some(format!(
                        "{} and {} share completed_at but are not chain-linked",
                        a.facto_id, b.facto_id
                    )),
                };
            }
        } else if actual(a) != Some(b.proof.prev_hash.as_str()) {
            return ChainVerdict {
                session_id: session_id.to_string(),
                valid: false,
                reason: Some(format!(
                    "{}.prev_hash does not match {}.event_hash (recomputed)",
                    b.facto_id, a.facto_id
                )),
            };
        }
    }

    ChainVerdict {
        session_id: session_id.to_string(),
        valid: true,
        reason: None,
    }
}

/// Verify every hash, signature, chain link and Merkle proof in `bundle`,
/// accumulating a full report rather than stopping at the first failure.
pub fn verify_evidence_bundle(bundle: &EvidenceBundle, options: VerifyOptions) -> VerificationReport {
    let events: Vec<EventVerdict> = bundle.events.iter().map(verify_event).collect();

    let actual_hashes: HashMap<&str, Option<String>> = bundle
        .events
        .iter()
        .map(|e| (e.facto_id.as_str(), recomputed_hash(e)))
        .collect();

    let mut by_session: HashMap<&str, Vec<&FactoEvent>> = HashMap::new();
    for event in &bundle.events {
        by_session
            .entry(event.session_id.as_str())
            .or_default()
            .push(event);
    }
    let mut chains: Vec<ChainVerdict> = by_session
        .iter()
        .map(|(session_id, events)| verify_chain(session_id, events, &actual_hashes))
        .collect();
    chains.sort_by(|a, b| a.session_id.cmp(&b.session_id));

    let by_facto_id: HashMap<&str, &FactoEvent> = bundle
        .events
        .iter()
        .map(|e| (e.facto_id.as_str(), e))
        .collect();

    // A session is inconsistent if its proofs disagree on the root — that
    // disagreement is itself evidence of tampering even if each proof
    // folds correctly in isolation.
    let mut roots_by_session: HashMap<&str, HashSet<&str>> = HashMap::new();
    for entry in &bundle.merkle_proofs {
        if let Some(event) = by_facto_id.get(entry.facto_id.as_str()) {
            roots_by_session
                .entry(event.session_id.as_str())
                .or_default()
                .insert(entry.root.as_str());
        }
    }

    let merkle: Vec<MerkleVerdict> = bundle
        .merkle_proofs
        .iter()
        .map(|entry| {
            let Some(event) = by_facto_id.get(entry.facto_id.as_str()) else {
                return MerkleVerdict {
                    facto_id: entry.facto_id.clone(),
                    valid: false,
                    reason: Some("facto_id referenced by proof is not present in the bundle".into()),
                };
            };
            if event.proof.event_hash != entry.event_hash {
                return MerkleVerdict {
                    facto_id: entry.facto_id.clone(),
                    valid: false,
                    reason: Some("proof's event_hash does not match the event in the bundle".into()),
                };
            }
            if roots_by_session
                .get(event.session_id.as_str())
                .map(|roots| roots.len() > 1)
                .unwrap_or(false)
            {
                return MerkleVerdict {
                    facto_id: entry.facto_id.clone(),
                    valid: false,
                    reason: Some("session's Merkle proofs do not share a single root".into()),
                };
            }
            let valid = verify_inclusion(&entry.event_hash, &entry.proof, &entry.root);
            MerkleVerdict {
                facto_id: entry.facto_id.clone(),
                valid,
                reason: if valid {
                    None
                } else {
                    Some("proof does not fold to the claimed root".into())
                },
            }
        })
        .collect();

    let missing_merkle_coverage: Vec<String> = if options.strict {
        let proven: HashSet<&str> = bundle
            .merkle_proofs
            .iter()
            .map(|p| p.facto_id.as_str())
            .collect();
        bundle
            .events
            .iter()
            .filter(|e| !proven.contains(e.facto_id.as_str()))
            .map(|e| e.facto_id.clone())
            .collect()
    } else {
        Vec::new()
    };

    let is_valid = events.iter().all(|e| e.hash_valid && e.sig_valid)
        && chains.iter().all(|c| c.valid)
        && merkle.iter().all(|m| m.valid)
        && missing_merkle_coverage.is_empty();

    VerificationReport {
        events,
        chains,
        merkle,
        missing_merkle_coverage,
        is_valid,
    }
}
