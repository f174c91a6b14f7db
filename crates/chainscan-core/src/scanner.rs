//! Scan orchestrator — resolves the range, wires the pool, and joins it.
//!
//! One `Scanner` performs one bounded run: resolve the starting height from
//! the persisted checkpoint vs. the requested start, build the allocator and
//! commit tracker for the resolved range, spawn the worker pool, and return
//! once every worker has drained the allocator. The same engine serves every
//! chain — only the source and sink differ.

use std::sync::Arc;

use tracing::info;

use crate::allocator::HeightAllocator;
use crate::checkpoint::CheckpointStore;
use crate::committer::CommitTracker;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::sink::EventSink;
use crate::source::BlockSource;
use crate::worker::Worker;

/// Orchestrates one scan run over `[resolved_start, end]`.
pub struct Scanner<S, K> {
    config: ScanConfig,
    source: Arc<S>,
    sink: Arc<K>,
    store: Arc<dyn CheckpointStore>,
}

impl<S, K> Scanner<S, K>
where
    S: BlockSource + 'static,
    K: EventSink + 'static,
{
    pub fn new(
        config: ScanConfig,
        source: Arc<S>,
        sink: Arc<K>,
        store: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            config,
            source,
            sink,
            store,
        }
    }

    /// Resolve the scan start: never below the requested floor, never below an
    /// already-committed height.
    fn resolve_start(&self, checkpoint_height: Option<u64>) -> u64 {
        match checkpoint_height {
            Some(committed) => self.config.start_height.max(committed),
            None => self.config.start_height,
        }
    }

    /// Run the scan to completion.
    ///
    /// Returns once every worker has terminated — a join barrier over the
    /// whole pool, even for an empty resolved range. Transient fetch errors
    /// are retried inside the workers; only fatal conditions (config,
    /// checkpoint write) surface here.
    pub async fn run(&self) -> Result<(), ScanError> {
        self.config.validate()?;

        let checkpoint = self.store.load(&self.config.chain_id).await?;
        let resolved_start = self.resolve_start(checkpoint.as_ref().map(|cp| cp.height));

        info!(
            chain = %self.config.chain_id,
            requested_start = self.config.start_height,
            resolved_start,
            end = self.config.end_height,
            workers = self.config.workers,
            "starting scan"
        );

        let allocator = Arc::new(HeightAllocator::new(resolved_start, self.config.end_height));
        let tracker = Arc::new(CommitTracker::new(
            &self.config.chain_id,
            self.store.clone(),
            resolved_start,
        ));

        let mut handles = Vec::with_capacity(self.config.workers);
        for id in 0..self.config.workers {
            let worker = Worker {
                id,
                chain_id: self.config.chain_id.clone(),
                source: self.source.clone(),
                sink: self.sink.clone(),
                allocator: allocator.clone(),
                tracker: tracker.clone(),
                base_backoff: self.config.base_backoff,
                max_backoff: self.config.max_backoff,
                progress_every: self.config.progress_every,
            };
            handles.push(tokio::spawn(worker.run()));
        }

        // Join the whole pool before reporting anything — the first fatal
        // error wins, but every worker gets to finish winding down.
        let mut outcome = Ok(());
        for handle in handles {
            let result = handle
                .await
                .unwrap_or_else(|e| Err(ScanError::Other(format!("worker panicked: {e}"))));
            if outcome.is_ok() {
                outcome = result;
            }
        }
        outcome?;

        info!(
            chain = %self.config.chain_id,
            committed = ?tracker.last_committed().await,
            "scan complete"
        );
        Ok(())
    }
}
