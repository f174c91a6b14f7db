//! JSON-RPC 2.0 wire types and the HTTP node client.
//!
//! The client is deliberately thin: one POST per call, no internal retry —
//! the scan worker owns the retry policy, so a transport error here simply
//! surfaces as a transient `ScanError::Source`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use chainscan_core::error::ScanError;

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Unwrap the result value or return the RPC error.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        if let Some(err) = self.error {
            Err(err)
        } else {
            Ok(self.result.unwrap_or(Value::Null))
        }
    }
}

// ─── Transport trait ─────────────────────────────────────────────────────────

/// Trait for sending raw JSON-RPC calls to a node.
///
/// Abstracting the transport keeps the block source testable without a live
/// node.
#[async_trait::async_trait]
pub trait NodeRpc: Send + Sync {
    /// Send one call and return its `result` value.
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ScanError>;
}

// ─── HTTP client ─────────────────────────────────────────────────────────────

/// HTTP JSON-RPC client backed by `reqwest`.
#[derive(Debug)]
pub struct HttpNodeClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpNodeClient {
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a client for a single endpoint, without probing it.
    pub fn new(url: impl Into<String>) -> Result<Self, ScanError> {
        let http = reqwest::Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ScanError::Source(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Probe `endpoints` in order and return a client for the first one that
    /// answers a `system_health` call.
    ///
    /// Failover *across* endpoints mid-run is not attempted — the run sticks
    /// with the endpoint selected here and relies on per-height retry.
    pub async fn connect(endpoints: &[String]) -> Result<Self, ScanError> {
        if endpoints.is_empty() {
            return Err(ScanError::Config("no node endpoint configured".into()));
        }

        for url in endpoints {
            let client = Self::new(url)?;
            match client.call("system_health", vec![]).await {
                Ok(_) => {
                    debug!(url = %url, "node endpoint selected");
                    return Ok(client);
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "node endpoint unreachable, trying next");
                }
            }
        }

        Err(ScanError::Source(format!(
            "no reachable node endpoint among {} candidates",
            endpoints.len()
        )))
    }

    /// The endpoint this client talks to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl NodeRpc for HttpNodeClient {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ScanError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| ScanError::Source(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ScanError::Source(format!("HTTP {status}: {body}")));
        }

        let rpc: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| ScanError::Source(e.to_string()))?;

        rpc.into_result()
            .map_err(|e| ScanError::Source(e.to_string()))
    }
}
