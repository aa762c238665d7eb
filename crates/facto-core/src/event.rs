//! The Facto event data model.
//!
//! A [`FactoEvent`] is the atomic, immutable-once-signed unit of an audit
//! trail: one LLM call, tool invocation, or task boundary. See
//! `facto-core::canon` for which of these fields participate in the
//! canonical form that gets hashed and signed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 64 ASCII zero characters: the `prev_hash` of the first event in a session.
pub fn zero_hash() -> String {
    "0".repeat(64)
}

/// Outcome of a recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Failure,
    InProgress,
}

impl Default for Status {
    fn default() -> Self {
        Self::Success
    }
}

/// Execution metadata recognized by the protocol.
///
/// Only `model_id`, `seed`, `sdk_version`, `temperature` and `tool_calls`
/// are part of the canonical form (`facto-core::canon::CanonicalMeta`);
/// the remaining fields here round-trip through (de)serialization but are
/// never hashed or signed, so changing them is detectable only at the
/// application level, not cryptographically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMeta {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub model_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_tokens: Option<u64>,
    #[serde(default)]
    pub tool_calls: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sdk_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sdk_language: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Fields outside the recognized set. Preserved verbatim, never
    /// canonical, never hashed.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The cryptographic commitment attached to a [`FactoEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    /// `event_hash` of the previous event in this session, or 64 zeros.
    pub prev_hash: String,
    /// Lowercase hex SHA3-256 of `canonical_bytes(event)`.
    pub event_hash: String,
    /// Base64 of the 64 raw Ed25519 signature bytes over `canonical_bytes(event)`.
    pub signature: String,
    /// Base64 of the 32 raw Ed25519 verifying-key bytes.
    pub public_key: String,
    /// Present only if an upstream producer injected a (refused) algorithm
    /// tag. Never consulted by the signer or verifier.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alg: Option<String>,
}

/// A single, fully-populated audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoEvent {
    pub facto_id: String,
    pub agent_id: String,
    pub session_id: String,
    #[serde(default)]
    pub parent_facto_id: Option<String>,
    pub action_type: String,
    pub status: Status,
    #[serde(default = "serde_json::Value::default")]
    pub input_data: serde_json::Value,
    #[serde(default = "serde_json::Value::default")]
    pub output_data: serde_json::Value,
    #[serde(default)]
    pub execution_meta: ExecutionMeta,
    pub started_at: i64,
    pub completed_at: i64,
    pub proof: Proof,
}

impl FactoEvent {
    /// `true` if `facto_id` has the required `ft-` prefix.
    pub fn has_valid_id_format(&self) -> bool {
        self.facto_id.starts_with("ft-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hash_is_64_zeros() {
        let z = zero_hash();
        assert_eq!(z.len(), 64);
        assert!(z.chars().all(|c| c == '0'));
    }

    #[test]
    fn status_serializes_lowercase_snake_case() {
        assert_eq!(serde_json::to_string(&Status::Success).unwrap(), "\"success\"");
        assert_eq!(serde_json::to_string(&Status::Failure).unwrap(), "\"failure\"");
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn execution_meta_preserves_unknown_fields() {
        let json = serde_json::json!({
            "model_id": "gpt-4",
            "totally_unknown_field": "stays",
        });
        let meta: ExecutionMeta = serde_json::from_value(json).unwrap();
        assert_eq!(meta.model_id.as_deref(), Some("gpt-4"));
        assert_eq!(
            meta.extra.get("totally_unknown_field").and_then(|v| v.as_str()),
            Some("stays")
        );
    }
}
