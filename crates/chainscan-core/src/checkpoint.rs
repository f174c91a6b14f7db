//! Checkpoint types and store — persists scan progress for crash recovery.
//!
//! A checkpoint records the last fully processed height for a chain. On
//! restart, the scanner resumes from the checkpoint rather than re-scanning
//! from scratch. Writes are monotonically non-decreasing and only ever issued
//! by the commit tracker.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// A persisted checkpoint for one chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Chain slug (e.g. `"consensus"`).
    pub chain_id: String,
    /// Last height up to which *every* height has been fully processed.
    pub height: u64,
    /// Unix timestamp of when this checkpoint was saved.
    pub updated_at: i64,
}

impl Checkpoint {
    /// Create a checkpoint stamped with the current time.
    pub fn now(chain_id: impl Into<String>, height: u64) -> Self {
        Self {
            chain_id: chain_id.into(),
            height,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Trait for storing and loading checkpoints.
///
/// Implementations include `MemoryCheckpointStore` and the SQLite backend in
/// `chainscan-storage`. `save` is assumed durable once it returns; a `save`
/// error is fatal for the run.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the checkpoint for a chain (`None` if no prior progress).
    async fn load(&self, chain_id: &str) -> Result<Option<Checkpoint>, ScanError>;

    /// Save (upsert) a checkpoint.
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), ScanError>;

    /// Delete a checkpoint (e.g. when resetting a chain's scan state).
    async fn delete(&self, chain_id: &str) -> Result<(), ScanError>;
}

// ─── In-memory store (for testing) ───────────────────────────────────────────

use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory checkpoint store for tests and ephemeral scans.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    data: Mutex<HashMap<String, Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, chain_id: &str) -> Result<Option<Checkpoint>, ScanError> {
        Ok(self.data.lock().unwrap().get(chain_id).cloned())
    }

    async fn save(&self, checkpoint: Checkpoint) -> Result<(), ScanError> {
        self.data
            .lock()
            .unwrap()
            .insert(checkpoint.chain_id.clone(), checkpoint);
        Ok(())
    }

    async fn delete(&self, chain_id: &str) -> Result<(), ScanError> {
        self.data.lock().unwrap().remove(chain_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryCheckpointStore::new();

        // No checkpoint initially
        assert!(store.load("consensus").await.unwrap().is_none());

        store.save(Checkpoint::now("consensus", 1_000)).await.unwrap();

        let cp = store.load("consensus").await.unwrap().unwrap();
        assert_eq!(cp.height, 1_000);
        assert_eq!(cp.chain_id, "consensus");
    }

    #[tokio::test]
    async fn memory_store_chains_are_isolated() {
        let store = MemoryCheckpointStore::new();
        store.save(Checkpoint::now("consensus", 500)).await.unwrap();
        store.save(Checkpoint::now("domain", 42)).await.unwrap();

        assert_eq!(store.load("consensus").await.unwrap().unwrap().height, 500);
        assert_eq!(store.load("domain").await.unwrap().unwrap().height, 42);

        store.delete("domain").await.unwrap();
        assert!(store.load("domain").await.unwrap().is_none());
        assert!(store.load("consensus").await.unwrap().is_some());
    }
}
