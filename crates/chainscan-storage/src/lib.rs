//! chainscan-storage — pluggable storage backends for ChainScan.
//!
//! Backends:
//! - [`memory`] — in-memory (dev/testing, no persistence)
//! - [`sqlite`] — SQLite via `sqlx` (embedded, single-file persistence)
//!
//! Each backend stores per-chain checkpoints (implementing
//! `chainscan_core::CheckpointStore`) and the extracted events the sinks
//! produce, keyed by `(chain_id, block_height, event_index)` so that
//! re-processing a height overwrites instead of duplicating.

use async_trait::async_trait;

use chainscan_core::error::ScanError;
use chainscan_core::types::ExtractedEvent;

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::InMemoryStorage;

/// Trait for persisting extracted events.
///
/// Inserts are keyed by `(chain_id, block_height, event_index)`; writing the
/// same key again must replace the existing record, which is what makes sink
/// retries safe.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert (upsert) one extracted event.
    async fn insert_event(&self, event: &ExtractedEvent) -> Result<(), ScanError>;
}
