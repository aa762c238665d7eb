//! The Facto SDK: scoped recorders, batching and HTTP ingestion transport.
//!
//! [`client::FactoClient`] is the application-facing handle. It owns one
//! [`facto_core::EventBuilder`] (and therefore one signing key and one
//! hash chain) per session, plus the [`batcher::Batcher`] that buffers
//! and flushes signed events to an [`transport::IngestionClient`]. Three
//! equivalent ways to record an action sit on top of it:
//! [`client::FactoClient::record`] (explicit), [`client::FactoClient::scoped`]
//! (an RAII guard), and [`client::FactoClient::wrap`] (a closure wrapper).

pub mod batcher;
pub mod client;
pub mod config;
pub mod error;
pub mod recorder;
pub mod transport;

pub use batcher::{Batcher, BackoffStrategy};
pub use client::FactoClient;
pub use config::FactoConfig;
pub use error::{Error, Result};
pub use recorder::{ScopedRecording, Wrapped};
pub use transport::{HttpIngestionClient, IngestBatchResponse, IngestionClient, RecordingIngestionClient};
