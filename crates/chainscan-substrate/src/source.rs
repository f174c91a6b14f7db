//! Substrate block source — resolves heights to hashes, bodies, and events.
//!
//! Speaks the standard chain RPCs (`chain_getBlockHash`, `chain_getBlock`)
//! plus a decoded-events call for the block's event log. Archive gateways
//! deployed for indexing expose the event log as JSON; the method name is
//! configurable because consensus and domain nodes may mount it differently.

use serde_json::{json, Value};

use chainscan_core::error::ScanError;
use chainscan_core::source::BlockSource;
use chainscan_core::types::{RawBlock, RawEvent};

use crate::rpc::NodeRpc;

/// Default RPC method for fetching a block's decoded event log.
pub const DEFAULT_EVENTS_METHOD: &str = "chain_getEvents";

/// `BlockSource` implementation over a substrate-style JSON-RPC node.
pub struct SubstrateSource<C> {
    client: C,
    events_method: String,
}

impl<C: NodeRpc> SubstrateSource<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            events_method: DEFAULT_EVENTS_METHOD.into(),
        }
    }

    /// Override the decoded-events RPC method name.
    pub fn with_events_method(mut self, method: impl Into<String>) -> Self {
        self.events_method = method.into();
        self
    }
}

#[async_trait::async_trait]
impl<C: NodeRpc> BlockSource for SubstrateSource<C> {
    async fn block_hash(&self, height: u64) -> Result<String, ScanError> {
        let result = self
            .client
            .call("chain_getBlockHash", vec![json!(height)])
            .await?;

        match result {
            Value::String(hash) => Ok(hash),
            // The node returns null for heights it has not seen yet.
            Value::Null => Err(ScanError::Source(format!(
                "no block hash for height {height}"
            ))),
            other => Err(ScanError::Source(format!(
                "unexpected chain_getBlockHash result: {other}"
            ))),
        }
    }

    async fn block(&self, hash: &str) -> Result<RawBlock, ScanError> {
        let result = self.client.call("chain_getBlock", vec![json!(hash)]).await?;

        parse_signed_block(&result, hash)
    }

    async fn events_at(&self, hash: &str) -> Result<Vec<RawEvent>, ScanError> {
        let result = self
            .client
            .call(&self.events_method, vec![json!(hash)])
            .await?;

        serde_json::from_value(result).map_err(|e| ScanError::Source(e.to_string()))
    }
}

/// Parse a `chain_getBlock` response (`{ "block": { "header", "extrinsics" } }`).
fn parse_signed_block(value: &Value, hash: &str) -> Result<RawBlock, ScanError> {
    let block = value
        .get("block")
        .ok_or_else(|| ScanError::Source(format!("malformed block response for {hash}")))?;

    let number = block
        .pointer("/header/number")
        .and_then(Value::as_str)
        .ok_or_else(|| ScanError::Source(format!("block {hash} missing header number")))?;
    let height = parse_hex_u64(number)
        .ok_or_else(|| ScanError::Source(format!("bad block number {number:?} for {hash}")))?;

    let extrinsics = block
        .get("extrinsics")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    Ok(RawBlock {
        height,
        hash: hash.to_string(),
        extrinsics,
    })
}

/// Parse a hex-encoded string (with or without `0x`) to u64.
fn parse_hex_u64(s: &str) -> Option<u64> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).ok()
}
