//! chainscan-substrate — substrate-chain bindings for the ChainScan engine.
//!
//! Provides the three pieces the chain-agnostic core leaves open:
//! - [`rpc`] — JSON-RPC wire types and an HTTP node client with
//!   first-reachable endpoint selection
//! - [`source`] — a `BlockSource` over the chain RPCs
//! - [`extract`] — event matchers and the storage-backed `EventSink`,
//!   including the consensus/domain chain presets

pub mod extract;
pub mod rpc;
pub mod source;

pub use extract::{consensus_matcher, domain_matcher, EventMatcher, ExtractSink};
pub use rpc::{HttpNodeClient, NodeRpc};
pub use source::SubstrateSource;
