//! Shared types for the scan pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── RawBlock ────────────────────────────────────────────────────────────────

/// A block body as returned by the block source — the ordered list of
/// extrinsics plus the identifiers the sink needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock {
    /// Block height.
    pub height: u64,
    /// Block hash (`0x…`).
    pub hash: String,
    /// Ordered extrinsics, kept as raw JSON — decoding is the sink's concern.
    pub extrinsics: Vec<Value>,
}

// ─── RawEvent ────────────────────────────────────────────────────────────────

/// A single event from a block's event log.
///
/// `section`/`method` identify the pallet and event name (e.g. `balances` /
/// `Transfer`); `data` carries the decoded fields as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub section: String,
    pub method: String,
    #[serde(default)]
    pub data: Value,
    /// Index of the extrinsic this event belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extrinsic_index: Option<u32>,
}

impl RawEvent {
    /// Returns `true` if the event is `section.method` (case-insensitive).
    pub fn is(&self, section: &str, method: &str) -> bool {
        self.section.eq_ignore_ascii_case(section) && self.method.eq_ignore_ascii_case(method)
    }
}

// ─── BlockData ───────────────────────────────────────────────────────────────

/// Everything a worker hands to the event sink for one height: the block body
/// and its event log, plus the chain the data came from.
#[derive(Debug, Clone)]
pub struct BlockData {
    /// Chain slug (e.g. `"consensus"`, `"domain"`).
    pub chain_id: String,
    /// Block height.
    pub height: u64,
    /// Block hash.
    pub hash: String,
    /// Ordered extrinsics.
    pub extrinsics: Vec<Value>,
    /// Ordered event log for the block.
    pub events: Vec<RawEvent>,
}

// ─── ExtractedEvent ──────────────────────────────────────────────────────────

/// A persisted record of interest, produced by an event sink.
///
/// `(chain_id, block_height, event_index)` uniquely identifies a record, so
/// re-processing a height overwrites rather than duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEvent {
    pub chain_id: String,
    pub block_height: u64,
    pub block_hash: String,
    /// Position of the event within the block's event log.
    pub event_index: u32,
    pub section: String,
    pub method: String,
    pub data: Value,
}
