//! In-memory storage backend.
//!
//! Stores checkpoints and extracted events in RAM. Useful for testing and
//! dry-run scans that don't need persistence.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chainscan_core::checkpoint::{Checkpoint, CheckpointStore};
use chainscan_core::error::ScanError;
use chainscan_core::types::ExtractedEvent;

use crate::EventStore;

/// Key uniquely identifying one extracted event.
type EventKey = (String, u64, u32);

/// In-memory scan storage.
///
/// All data is lost when the process exits.
#[derive(Default)]
pub struct InMemoryStorage {
    checkpoints: Mutex<HashMap<String, Checkpoint>>,
    events: Mutex<BTreeMap<EventKey, ExtractedEvent>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events extracted for a chain, ordered by height then event index.
    pub fn events_for_chain(&self, chain_id: &str) -> Vec<ExtractedEvent> {
        self.events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.chain_id == chain_id)
            .cloned()
            .collect()
    }

    /// All events extracted at one height of a chain.
    pub fn events_at_height(&self, chain_id: &str, height: u64) -> Vec<ExtractedEvent> {
        self.events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.chain_id == chain_id && e.block_height == height)
            .cloned()
            .collect()
    }

    /// Total number of stored events across all chains.
    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl EventStore for InMemoryStorage {
    async fn insert_event(&self, event: &ExtractedEvent) -> Result<(), ScanError> {
        let key = (
            event.chain_id.clone(),
            event.block_height,
            event.event_index,
        );
        // Keyed insert: a retried height overwrites its earlier records.
        self.events.lock().unwrap().insert(key, event.clone());
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for InMemoryStorage {
    async fn load(&self, chain_id: &str) -> Result<Option<Checkpoint>, ScanError> {
        Ok(self.checkpoints.lock().unwrap().get(chain_id).cloned())
    }

    async fn save(&self, checkpoint: Checkpoint) -> Result<(), ScanError> {
        self.checkpoints
            .lock()
            .unwrap()
            .insert(checkpoint.chain_id.clone(), checkpoint);
        Ok(())
    }

    async fn delete(&self, chain_id: &str) -> Result<(), ScanError> {
        self.checkpoints.lock().unwrap().remove(chain_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(chain: &str, height: u64, index: u32) -> ExtractedEvent {
        ExtractedEvent {
            chain_id: chain.into(),
            block_height: height,
            block_hash: format!("0x{height:x}"),
            event_index: index,
            section: "balances".into(),
            method: "Transfer".into(),
            data: serde_json::json!({ "amount": height.to_string() }),
        }
    }

    #[tokio::test]
    async fn insert_and_query_events() {
        let store = InMemoryStorage::new();
        store.insert_event(&ev("consensus", 100, 0)).await.unwrap();
        store.insert_event(&ev("consensus", 100, 1)).await.unwrap();
        store.insert_event(&ev("domain", 100, 0)).await.unwrap();

        assert_eq!(store.event_count(), 3);
        assert_eq!(store.events_for_chain("consensus").len(), 2);
        assert_eq!(store.events_at_height("domain", 100).len(), 1);
    }

    #[tokio::test]
    async fn reinserting_same_height_is_idempotent() {
        let store = InMemoryStorage::new();
        store.insert_event(&ev("consensus", 100, 0)).await.unwrap();
        store.insert_event(&ev("consensus", 100, 1)).await.unwrap();

        // Retry of height 100 writes the same records again.
        store.insert_event(&ev("consensus", 100, 0)).await.unwrap();
        store.insert_event(&ev("consensus", 100, 1)).await.unwrap();

        assert_eq!(store.event_count(), 2);
        assert_eq!(store.events_at_height("consensus", 100).len(), 2);
    }

    #[tokio::test]
    async fn checkpoint_roundtrip() {
        let store = InMemoryStorage::new();
        assert!(store.load("consensus").await.unwrap().is_none());

        store.save(Checkpoint::now("consensus", 1_000)).await.unwrap();
        assert_eq!(store.load("consensus").await.unwrap().unwrap().height, 1_000);

        store.delete("consensus").await.unwrap();
        assert!(store.load("consensus").await.unwrap().is_none());
    }
}
