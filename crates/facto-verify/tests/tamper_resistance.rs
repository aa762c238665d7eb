//! Adversarial end-to-end scenarios: each one
//! builds a valid bundle with `facto-core`/`facto-merkle` and then applies
//! exactly the tamper a real attacker would attempt, checking that
//! `verify_evidence_bundle` rejects it for the *right* reason — a
//! tampered bundle that merely fails somewhere is not the same guarantee
//! as one that fails at the specific invariant the attack targets.

use facto_core::builder::{BuildParams, EventBuilder};
use facto_core::{canon, hash, sign};
use facto_merkle::MerkleTree;
use facto_verify::{verify_evidence_bundle, EvidenceBundle, MerkleProofEntry, VerifyOptions};

#[test]
fn chain_of_three_with_a_mutated_middle_event() {
    let mut builder = EventBuilder::new("agent-1", "session-1");
    let e1 = builder.build(BuildParams::new("first")).unwrap();
    let mut e2 = builder.build(BuildParams::new("second")).unwrap();
    let e3 = builder.build(BuildParams::new("third")).unwrap();

    e2.output_data = serde_json::json!({"y": 3});

    let bundle = EvidenceBundle {
        events: vec![e1, e2, e3],
        merkle_proofs: vec![],
    };
    let report = verify_evidence_bundle(&bundle, VerifyOptions::default());

    assert_eq!(report.hashes_invalid(), 1);
    assert_eq!(report.signatures_invalid(), 1);
    assert_eq!(report.chains_invalid(), 1);
    assert!(!report.is_valid);
}

#[test]
fn signature_substitution_from_a_fresh_key_fails_verification() {
    let mut builder = EventBuilder::new("agent-1", "session-1");
    let mut e1 = builder.build(BuildParams::new("first")).unwrap();

    let attacker = sign::Signer::generate();
    let canonical = canon::canonical_bytes(&e1).unwrap();
    e1.proof.signature = attacker.sign(&canonical).unwrap();

    let bundle = EvidenceBundle {
        events: vec![e1],
        merkle_proofs: vec![],
    };
    let report = verify_evidence_bundle(&bundle, VerifyOptions::default());
    assert_eq!(report.signatures_invalid(), 1);
    assert_eq!(report.hashes_valid(), 1);
}

#[test]
fn key_substitution_with_resigning_breaks_the_chain_not_the_signature() {
    let mut builder = EventBuilder::new("agent-1", "session-1");
    let mut e1 = builder.build(BuildParams::new("first")).unwrap();
    let e2 = builder.build(BuildParams::new("second")).unwrap();

    let attacker = sign::Signer::generate();
    e1.output_data = serde_json::json!({"tampered": true});
    e1.proof.public_key = attacker.public_key_base64();
    let canonical = canon::canonical_bytes(&e1).unwrap();
    e1.proof.event_hash = hash::hex_digest(&canonical);
    e1.proof.signature = attacker.sign(&canonical).unwrap();

    let bundle = EvidenceBundle {
        events: vec![e1, e2],
        merkle_proofs: vec![],
    };
    let report = verify_evidence_bundle(&bundle, VerifyOptions::default());

    // The attacker's forged event is internally consistent...
    assert_eq!(report.hashes_valid(), 2);
    assert_eq!(report.signatures_valid(), 2);
    // ...but e2 still commits to the original e1, which no longer exists.
    assert_eq!(report.chains_invalid(), 1);
    assert!(!report.is_valid);
}

#[test]
fn truncated_tail_with_a_dangling_merkle_proof_is_detected() {
    let mut builder = EventBuilder::new("agent-1", "session-1");
    let e1 = builder.build(BuildParams::new("first")).unwrap();
    let e2 = builder.build(BuildParams::new("second")).unwrap();

    let hashes = [e1.proof.event_hash.clone(), e2.proof.event_hash.clone()];
    let tree = MerkleTree::from_event_hashes(&hashes).unwrap();
    let proof = tree.prove(1).unwrap();
    let dangling = MerkleProofEntry {
        facto_id: e2.facto_id.clone(),
        event_hash: e2.proof.event_hash.clone(),
        root: tree.root_hex(),
        proof,
    };

    // e2 itself is dropped from the bundle; its proof is retained.
    let bundle = EvidenceBundle {
        events: vec![e1],
        merkle_proofs: vec![dangling],
    };
    let report = verify_evidence_bundle(&bundle, VerifyOptions::default());
    assert_eq!(report.merkle_valid(), 0);
    assert!(!report.is_valid);
}

#[test]
fn algorithm_downgrade_tag_is_ignored_and_the_zeroed_signature_still_fails() {
    let mut builder = EventBuilder::new("agent-1", "session-1");
    let mut e1 = builder.build(BuildParams::new("first")).unwrap();
    e1.proof.alg = Some("none".into());
    e1.proof.signature =
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, [0u8; 64]);

    let bundle = EvidenceBundle {
        events: vec![e1],
        merkle_proofs: vec![],
    };
    let report = verify_evidence_bundle(&bundle, VerifyOptions::default());
    assert_eq!(report.signatures_invalid(), 1);
}

#[test]
fn four_event_merkle_tree_proves_inclusion_and_rejects_a_flipped_bit() {
    let mut builder = EventBuilder::new("agent-1", "session-1");
    let events: Vec<_> = (0..4)
        .map(|i| builder.build(BuildParams::new(format!("action-{i}"))).unwrap())
        .collect();
    let hashes: Vec<&str> = events.iter().map(|e| e.proof.event_hash.as_str()).collect();
    let tree = MerkleTree::from_event_hashes(&hashes).unwrap();
    let proof = tree.prove(2).unwrap();

    let entry = MerkleProofEntry {
        facto_id: events[2].facto_id.clone(),
        event_hash: events[2].proof.event_hash.clone(),
        root: tree.root_hex(),
        proof,
    };
    let bundle = EvidenceBundle {
        events,
        merkle_proofs: vec![entry],
    };

    let report = verify_evidence_bundle(&bundle, VerifyOptions::default());
    assert_eq!(report.merkle_valid(), 1);
    assert_eq!(report.merkle_total(), 1);
    assert!(report.is_valid);

    let mut tampered = bundle;
    let mut bytes = hex::decode(&tampered.merkle_proofs[0].proof[0].hash).unwrap();
    bytes[0] ^= 0xFF;
    tampered.merkle_proofs[0].proof[0].hash = hex::encode(bytes);
    let report = verify_evidence_bundle(&tampered, VerifyOptions::default());
    assert_eq!(report.merkle_valid(), 0);
}
