//! Retrying worker — drains the height allocator, fetching and processing one
//! height at a time with exponential-backoff retry.
//!
//! A height is never abandoned: retry is unbounded by count, bounded only by
//! the growing-then-capped delay. The run prioritizes eventual completeness
//! over liveness under a persistently broken fetch path; the capped delay
//! keeps a stuck height from hammering the node while the checkpoint (held
//! back by the ordered commit tracker) keeps a hard-stop safe.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::allocator::HeightAllocator;
use crate::committer::CommitTracker;
use crate::error::ScanError;
use crate::sink::EventSink;
use crate::source::BlockSource;
use crate::types::BlockData;

// ─── Backoff ─────────────────────────────────────────────────────────────────

/// Exponential backoff: starts at `base`, doubles per failure, capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            current: base,
        }
    }

    /// The delay to wait now; doubles the delay for the next failure.
    pub fn next(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    /// Return to the base delay (called once a height succeeds).
    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

// ─── Worker ──────────────────────────────────────────────────────────────────

/// One member of the scan pool.
///
/// Loops: take a height from the allocator (terminate when exhausted), fetch
/// hash + body + events as one logical unit, hand the bundle to the sink, and
/// report completion to the commit tracker. Any fetch/process failure retries
/// the *same* height from scratch — the sink is idempotent per height, so
/// partial writes from a failed attempt are safely overwritten.
pub(crate) struct Worker<S, K> {
    pub id: usize,
    pub chain_id: String,
    pub source: Arc<S>,
    pub sink: Arc<K>,
    pub allocator: Arc<HeightAllocator>,
    pub tracker: Arc<CommitTracker>,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub progress_every: u64,
}

impl<S: BlockSource, K: EventSink> Worker<S, K> {
    /// Run until the allocator is exhausted.
    ///
    /// Only a checkpoint write failure escapes — transient fetch/process
    /// errors are retried in place and never surface to the caller.
    pub(crate) async fn run(self) -> Result<(), ScanError> {
        let mut backoff = Backoff::new(self.base_backoff, self.max_backoff);

        while let Some(height) = self.allocator.next() {
            loop {
                match self.process_height(height).await {
                    Ok(()) => {
                        self.tracker.mark_complete(height).await?;
                        backoff.reset();
                        if self.progress_every > 0 && height % self.progress_every == 0 {
                            info!(
                                chain = %self.chain_id,
                                height,
                                worker = self.id,
                                "scan progress"
                            );
                        }
                        break;
                    }
                    Err(e) => {
                        let delay = backoff.next();
                        warn!(
                            chain = %self.chain_id,
                            height,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "height failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        debug!(chain = %self.chain_id, worker = self.id, "allocator exhausted, worker done");
        Ok(())
    }

    /// One logical unit of work for a height: hash → body → events → sink.
    async fn process_height(&self, height: u64) -> Result<(), ScanError> {
        let hash = self.source.block_hash(height).await?;
        let block = self.source.block(&hash).await?;
        let events = self.source.events_at(&hash).await?;

        self.sink
            .process(&BlockData {
                chain_id: self.chain_id.clone(),
                height,
                hash,
                extrinsics: block.extrinsics,
                events,
            })
            .await
    }
}
