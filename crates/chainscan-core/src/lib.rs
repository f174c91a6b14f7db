//! chainscan-core — bounded, resumable block scanning with in-order commits.
//!
//! # Architecture
//!
//! ```text
//! Scanner → worker pool (N × Worker)
//!              ├── HeightAllocator  (unique heights from [start, end])
//!              ├── BlockSource      (hash / body / events per height)
//!              ├── EventSink        (idempotent per-height extraction)
//!              └── CommitTracker    (out-of-order completion → in-order
//!                                    checkpoint via CheckpointStore)
//! ```
//!
//! Heights may finish in any order across workers; the checkpoint only ever
//! advances along the contiguous completed prefix, so a crash-and-resume can
//! never skip a height that was not actually processed.

pub mod allocator;
pub mod checkpoint;
pub mod committer;
pub mod config;
pub mod error;
pub mod scanner;
pub mod sink;
pub mod source;
pub mod types;

mod worker;

pub use allocator::HeightAllocator;
pub use checkpoint::{Checkpoint, CheckpointStore, MemoryCheckpointStore};
pub use committer::CommitTracker;
pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::ScanError;
pub use scanner::Scanner;
pub use sink::EventSink;
pub use source::BlockSource;
pub use types::{BlockData, ExtractedEvent, RawBlock, RawEvent};
pub use worker::Backoff;
