//! JSON-RPC 2.0 wire types and the transport trait.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chainreg_core::RegistryError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

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
    /// Successful response carrying `result`.
    pub fn ok(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: Value::from(id),
            result: Some(result),
            error: None,
        }
    }

    /// The result value, `Null` if absent, or the node's error.
    pub fn into_result(self) -> Result<Value, RegistryError> {
        match self.error {
            Some(err) => Err(RegistryError::Rpc(format!(
                "{} (code {})",
                err.message, err.code
            ))),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Sends JSON-RPC requests to a node.
///
/// Implementations do not retry. Timeouts are their own concern and surface
/// as [`RegistryError::Timeout`].
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, RegistryError>;

    /// Endpoint identifier for logs.
    fn url(&self) -> &str;
}

/// Typed calls over a transport with monotonically increasing request ids.
pub struct RpcClient<T> {
    transport: T,
    next_id: AtomicU64,
}

impl<T: RpcTransport> RpcClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Call `method` and deserialize its result.
    pub async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<R, RegistryError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(id, method, url = self.transport.url(), "rpc call");
        let resp = self
            .transport
            .send(JsonRpcRequest::new(id, method, params))
            .await?;
        let result = resp.into_result()?;
        serde_json::from_value(result)
            .map_err(|e| RegistryError::Rpc(format!("invalid {method} result: {e}")))
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(s: &str) -> Result<u64, RegistryError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16)
        .map_err(|e| RegistryError::Rpc(format!("invalid quantity '{s}': {e}")))
}

/// Encode a quantity as `0x`-prefixed hex without leading zeros.
pub fn to_quantity(n: impl Into<u128>) -> String {
    format!("0x{:x}", n.into())
}
