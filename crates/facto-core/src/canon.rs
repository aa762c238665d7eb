//! The Canonicalizer.
//!
//! Produces the single, language-independent byte form that gets hashed
//! and signed. The canonical field set is fixed and versioned here — see the
//! module-level doc on [`CanonicalMeta`] before adding a field.
//!
//! Built as a dedicated struct holding exactly the canonical fields,
//! serialized with `serde_jcs` (RFC 8785 JSON Canonicalization Scheme).
//! JCS recursively sorts object keys and strips insignificant whitespace
//! in one pass, so the struct's own field declaration order does not
//! matter — only which fields it declares.

use crate::error::{Error, Result};
use crate::event::{ExecutionMeta, FactoEvent, Status};
use serde::Serialize;

/// The canonical subset of `execution_meta`.
///
/// Locked by protocol: `model_hash`, `max_tokens`, `sdk_language`, `tags`
/// and any unrecognized field are deliberately excluded. Adding a field
/// here changes every historical hash — treat it as a breaking change.
#[derive(Serialize)]
struct CanonicalMeta<'a> {
    model_id: &'a Option<String>,
    seed: &'a Option<i64>,
    sdk_version: &'a Option<String>,
    temperature: &'a Option<f64>,
    tool_calls: &'a [serde_json::Value],
}

impl<'a> From<&'a ExecutionMeta> for CanonicalMeta<'a> {
    fn from(meta: &'a ExecutionMeta) -> Self {
        Self {
            model_id: &meta.model_id,
            seed: &meta.seed,
            sdk_version: &meta.sdk_version,
            temperature: &meta.temperature,
            tool_calls: &meta.tool_calls,
        }
    }
}

/// The exact field set hashed and signed. Adding a field here changes
/// every future event's hash; removing one is a breaking wire change.
#[derive(Serialize)]
struct CanonicalForm<'a> {
    action_type: &'a str,
    agent_id: &'a str,
    completed_at: i64,
    execution_meta: CanonicalMeta<'a>,
    facto_id: &'a str,
    input_data: &'a serde_json::Value,
    output_data: &'a serde_json::Value,
    parent_facto_id: &'a Option<String>,
    prev_hash: &'a str,
    session_id: &'a str,
    started_at: i64,
    status: Status,
}

/// Produce the canonical byte serialization of `event`.
///
/// Deterministic and total over well-formed events: two events differing
/// only in non-canonical fields (`execution_meta.tags`, map key insertion
/// order, etc.) produce byte-identical output.
pub fn canonical_bytes(event: &FactoEvent) -> Result<Vec<u8>> {
    let form = CanonicalForm {
        action_type: &event.action_type,
        agent_id: &event.agent_id,
        completed_at: event.completed_at,
        execution_meta: CanonicalMeta::from(&event.execution_meta),
        facto_id: &event.facto_id,
        input_data: &event.input_data,
        output_data: &event.output_data,
        parent_facto_id: &event.parent_facto_id,
        prev_hash: &event.proof.prev_hash,
        session_id: &event.session_id,
        started_at: event.started_at,
        status: event.status,
    };

    serde_jcs::to_vec(&form).map_err(|e| Error::Canonicalization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{zero_hash, Proof};

    fn sample_event() -> FactoEvent {
        FactoEvent {
            facto_id: "ft-00000000-0000-0000-0000-000000000000".into(),
            agent_id: "agent-1".into(),
            session_id: "session-1".into(),
            parent_facto_id: None,
            action_type: "test".into(),
            status: Status::Success,
            input_data: serde_json::json!({"x": 1}),
            output_data: serde_json::json!({"y": 2}),
            execution_meta: ExecutionMeta::default(),
            started_at: 1_700_000_000_000_000_000,
            completed_at: 1_700_000_000_000_000_000,
            proof: Proof {
                prev_hash: zero_hash(),
                event_hash: String::new(),
                signature: String::new(),
                public_key: String::new(),
                alg: None,
            },
        }
    }

    #[test]
    fn canonical_bytes_has_no_insignificant_whitespace() {
        let event = sample_event();
        let bytes = canonical_bytes(&event).unwrap();
        let s = String::from_utf8(bytes).unwrap();
        assert!(!s.contains(", "));
        assert!(!s.contains(": "));
        assert!(!s.ends_with('\n'));
    }

    #[test]
    fn canonical_bytes_keys_are_lexicographic() {
        let event = sample_event();
        let bytes = canonical_bytes(&event).unwrap();
        let s = String::from_utf8(bytes).unwrap();
        let action_pos = s.find("\"action_type\"").unwrap();
        let agent_pos = s.find("\"agent_id\"").unwrap();
        let status_pos = s.find("\"status\"").unwrap();
        assert!(action_pos < agent_pos);
        assert!(agent_pos < status_pos);
    }

    #[test]
    fn canonicalization_is_independent_of_json_value_key_order() {
        let mut a = sample_event();
        let mut b = sample_event();
        a.input_data = serde_json::json!({"a": 1, "b": 2});
        b.input_data = serde_json::json!({"b": 2, "a": 1});
        assert_eq!(canonical_bytes(&a).unwrap(), canonical_bytes(&b).unwrap());
    }

    #[test]
    fn seed_null_and_seed_zero_differ() {
        let mut a = sample_event();
        let mut b = sample_event();
        a.execution_meta.seed = None;
        b.execution_meta.seed = Some(0);
        assert_ne!(canonical_bytes(&a).unwrap(), canonical_bytes(&b).unwrap());
    }

    #[test]
    fn non_finite_float_is_rejected() {
        let mut event = sample_event();
        event.execution_meta.temperature = Some(f64::NAN);
        assert!(canonical_bytes(&event).is_err());
    }

    #[test]
    fn execution_meta_tags_and_sdk_language_do_not_affect_hash() {
        let mut a = sample_event();
        let mut b = sample_event();
        a.execution_meta.sdk_language = Some("python".into());
        b.execution_meta.sdk_language = Some("rust".into());
        a.execution_meta.tags.insert("env".into(), "dev".into());
        assert_eq!(canonical_bytes(&a).unwrap(), canonical_bytes(&b).unwrap());
    }
}
