//! Event sink boundary — how extracted records leave the engine.

use async_trait::async_trait;

use crate::error::ScanError;
use crate::types::BlockData;

/// Trait for turning one block's raw data into persisted records.
///
/// Implementations must be idempotent per height: a worker retries a failed
/// height from scratch, so `process` may run more than once for the same
/// block, and partial writes from an earlier attempt must be overwritten or
/// become no-ops. Calls for *distinct* heights may run concurrently.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Extract and store the records of interest from one block.
    async fn process(&self, block: &BlockData) -> Result<(), ScanError>;
}
