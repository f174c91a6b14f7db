//! Ordered commit tracker — folds out-of-order completions into an in-order
//! checkpoint.
//!
//! Workers finish heights in arbitrary order, but the checkpoint published to
//! durable storage must always be a height up to and including which *every*
//! height has been processed. The tracker holds a commit cursor (the next
//! height expected to complete) and a pending set of finished-but-blocked
//! heights; a completion at the cursor advances it through every now-contiguous
//! pending member, writing the checkpoint once per advanced height.
//!
//! All cursor/pending mutations and all checkpoint writes happen under one
//! async mutex, so two concurrent `mark_complete` calls can never race the
//! read-modify-write or double-write a checkpoint value.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::error::ScanError;

struct CommitState {
    /// Next height expected to complete.
    cursor: u64,
    /// Heights that finished processing but are blocked by a lower in-flight
    /// height. Every member is above the cursor.
    pending: BTreeSet<u64>,
    /// Highest checkpoint value written so far, if any.
    last_committed: Option<u64>,
}

/// Records out-of-order completion notices and advances the persisted
/// checkpoint only when a contiguous prefix of completions is available.
pub struct CommitTracker {
    chain_id: String,
    store: Arc<dyn CheckpointStore>,
    state: Mutex<CommitState>,
}

impl CommitTracker {
    /// Create a tracker whose cursor starts at `start` (the resolved scan
    /// start — the first height this run will process).
    pub fn new(chain_id: impl Into<String>, store: Arc<dyn CheckpointStore>, start: u64) -> Self {
        Self {
            chain_id: chain_id.into(),
            store,
            state: Mutex::new(CommitState {
                cursor: start,
                pending: BTreeSet::new(),
                last_committed: None,
            }),
        }
    }

    /// Record that `height` finished processing.
    ///
    /// Duplicate notices for already-committed heights are no-ops. A failing
    /// checkpoint write propagates and is fatal for the run.
    pub async fn mark_complete(&self, height: u64) -> Result<(), ScanError> {
        let mut state = self.state.lock().await;

        if state.last_committed.is_some_and(|c| height <= c) {
            return Ok(());
        }
        state.pending.insert(height);

        loop {
            let committed = state.cursor;
            if !state.pending.remove(&committed) {
                break;
            }
            self.store
                .save(Checkpoint::now(&self.chain_id, committed))
                .await?;
            state.last_committed = Some(committed);
            state.cursor = committed.saturating_add(1);
            debug!(chain = %self.chain_id, height = committed, "checkpoint advanced");
        }

        Ok(())
    }

    /// Highest checkpoint value written so far in this run.
    pub async fn last_committed(&self) -> Option<u64> {
        self.state.lock().await.last_committed
    }

    /// Number of completed heights still blocked by a lower in-flight height.
    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }
}
