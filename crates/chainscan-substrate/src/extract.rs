//! Event extraction sinks — turn a block's event log into stored records.
//!
//! The scan engine is chain-agnostic; the only thing that differs between the
//! consensus chain and a domain chain is *which* events are worth keeping.
//! That variation lives entirely in the [`EventMatcher`], so one sink type
//! serves every chain.

use std::sync::Arc;

use chainscan_core::error::ScanError;
use chainscan_core::sink::EventSink;
use chainscan_core::types::{BlockData, ExtractedEvent, RawEvent};
use chainscan_storage::EventStore;

// ─── EventMatcher ────────────────────────────────────────────────────────────

/// Allow-list of `section.method` pairs to extract. An empty matcher keeps
/// every event.
#[derive(Debug, Clone, Default)]
pub struct EventMatcher {
    kinds: Vec<(String, String)>,
}

impl EventMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `section.method` pair to extract.
    pub fn kind(mut self, section: impl Into<String>, method: impl Into<String>) -> Self {
        self.kinds.push((section.into(), method.into()));
        self
    }

    /// Returns `true` if `event` should be extracted.
    pub fn matches(&self, event: &RawEvent) -> bool {
        self.kinds.is_empty() || self.kinds.iter().any(|(s, m)| event.is(s, m))
    }
}

/// Events of interest on the consensus chain: farming rewards and balance
/// movements.
pub fn consensus_matcher() -> EventMatcher {
    EventMatcher::new()
        .kind("rewards", "BlockReward")
        .kind("rewards", "VoteReward")
        .kind("balances", "Transfer")
}

/// Events of interest on a domain chain: balance movements and cross-domain
/// transfers.
pub fn domain_matcher() -> EventMatcher {
    EventMatcher::new()
        .kind("balances", "Transfer")
        .kind("transporter", "OutgoingTransferInitiated")
        .kind("transporter", "IncomingTransferSuccessful")
}

// ─── ExtractSink ─────────────────────────────────────────────────────────────

/// `EventSink` that writes matched events through an [`EventStore`].
///
/// Records are keyed by `(chain_id, height, event_index)` in the store, so a
/// retried height replaces its earlier rows — idempotent by construction.
pub struct ExtractSink<St> {
    store: Arc<St>,
    matcher: EventMatcher,
}

impl<St: EventStore> ExtractSink<St> {
    pub fn new(store: Arc<St>, matcher: EventMatcher) -> Self {
        Self { store, matcher }
    }
}

#[async_trait::async_trait]
impl<St: EventStore> EventSink for ExtractSink<St> {
    async fn process(&self, block: &BlockData) -> Result<(), ScanError> {
        for (index, event) in block.events.iter().enumerate() {
            if !self.matcher.matches(event) {
                continue;
            }
            self.store
                .insert_event(&ExtractedEvent {
                    chain_id: block.chain_id.clone(),
                    block_height: block.height,
                    block_hash: block.hash.clone(),
                    event_index: index as u32,
                    section: event.section.clone(),
                    method: event.method.clone(),
                    data: event.data.clone(),
                })
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use chainscan_storage::InMemoryStorage;

    fn event(section: &str, method: &str) -> RawEvent {
        RawEvent {
            section: section.into(),
            method: method.into(),
            data: json!({ "amount": "10" }),
            extrinsic_index: None,
        }
    }

    fn block_with(events: Vec<RawEvent>) -> BlockData {
        BlockData {
            chain_id: "consensus".into(),
            height: 100,
            hash: "0xabc".into(),
            extrinsics: vec![],
            events,
        }
    }

    #[test]
    fn empty_matcher_keeps_everything() {
        let matcher = EventMatcher::new();
        assert!(matcher.matches(&event("anything", "AtAll")));
    }

    #[test]
    fn consensus_matcher_selects_rewards() {
        let matcher = consensus_matcher();
        assert!(matcher.matches(&event("rewards", "BlockReward")));
        assert!(matcher.matches(&event("balances", "Transfer")));
        assert!(!matcher.matches(&event("system", "ExtrinsicSuccess")));
    }

    #[test]
    fn domain_matcher_selects_transporter_events() {
        let matcher = domain_matcher();
        assert!(matcher.matches(&event("transporter", "OutgoingTransferInitiated")));
        assert!(!matcher.matches(&event("rewards", "BlockReward")));
    }

    #[tokio::test]
    async fn sink_stores_only_matched_events_with_log_positions() {
        let store = Arc::new(InMemoryStorage::new());
        let sink = ExtractSink::new(store.clone(), consensus_matcher());

        sink.process(&block_with(vec![
            event("system", "ExtrinsicSuccess"),   // index 0, filtered
            event("rewards", "BlockReward"),       // index 1, kept
            event("system", "ExtrinsicSuccess"),   // index 2, filtered
            event("balances", "Transfer"),         // index 3, kept
        ]))
        .await
        .unwrap();

        let stored = store.events_at_height("consensus", 100);
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].event_index, 1);
        assert_eq!(stored[0].method, "BlockReward");
        assert_eq!(stored[1].event_index, 3);
        assert_eq!(stored[1].method, "Transfer");
    }

    #[tokio::test]
    async fn reprocessing_a_block_leaves_records_unchanged() {
        let store = Arc::new(InMemoryStorage::new());
        let sink = ExtractSink::new(store.clone(), consensus_matcher());
        let block = block_with(vec![event("rewards", "VoteReward")]);

        sink.process(&block).await.unwrap();
        sink.process(&block).await.unwrap();

        assert_eq!(store.event_count(), 1);
    }
}
