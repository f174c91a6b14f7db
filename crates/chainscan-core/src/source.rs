//! Block source boundary — how the engine fetches raw block data.

use async_trait::async_trait;

use crate::error::ScanError;
use crate::types::{RawBlock, RawEvent};

/// Trait for fetching block data from a node.
///
/// All three calls may fail transiently (network hiccup, node briefly
/// unavailable); the worker treats any failure identically and retries the
/// whole height from scratch.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Resolve a height to its block hash.
    async fn block_hash(&self, height: u64) -> Result<String, ScanError>;

    /// Fetch the block body for a hash.
    async fn block(&self, hash: &str) -> Result<RawBlock, ScanError>;

    /// Fetch the event log associated with a block hash.
    async fn events_at(&self, hash: &str) -> Result<Vec<RawEvent>, ScanError>;
}
