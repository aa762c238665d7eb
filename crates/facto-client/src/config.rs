//! `FactoConfig`: the recognized configuration options for a
//! [`crate::client::FactoClient`].
//!
//! A plain struct with a `Default` impl, not a builder macro. No
//! config-file format is mandated;
//! callers construct one directly or via [`FactoConfig::default`] and
//! override what they need.

use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration recognized by [`crate::client::FactoClient`].
#[derive(Debug, Clone)]
pub struct FactoConfig {
    /// Ingestion collaborator URL. POSTed to as `{endpoint}` directly
    /// (the `/v1/ingest/batch` path is the collaborator's, not appended
    /// here, so a caller can point at any compatible endpoint shape).
    pub endpoint: String,
    pub agent_id: String,
    /// Generated as a fresh UUID if left default-empty.
    pub session_id: String,
    /// 32 raw signing-key bytes. A fresh key is generated if absent.
    pub signing_key: Option<Vec<u8>>,
    /// Flush once this many events are buffered. `1` means "flush after
    /// every record" — not a special error case.
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub tags: BTreeMap<String, String>,
}

/// Default batch size: small enough that a crashed process loses little,
/// large enough that a busy session doesn't round-trip the network per event.
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
/// Hard cap on buffered-but-unflushed events before `record` backpressures
/// the caller.
pub const DEFAULT_HARD_CAP: usize = 10_000;

impl Default for FactoConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            agent_id: String::new(),
            session_id: uuid::Uuid::new_v4().to_string(),
            signing_key: None,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            tags: BTreeMap::new(),
        }
    }
}

impl FactoConfig {
    pub fn new(endpoint: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent_id: agent_id.into(),
            ..Default::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}
