//! Transport layer for RPC communication

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::SdkError;

/// Transport trait for RPC communication (object-safe)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send an RPC request and get the JSON `result`
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError>;
}

/// Helper to deserialize response
pub fn deserialize_response<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, SdkError> {
    serde_json::from_value(value).map_err(|e| SdkError::Serialization(e.to_string()))
}

/// A call recorded by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// RPC method
    pub method: String,
    /// Positional params
    pub params: Vec<Value>,
}

#[derive(Default)]
struct MockState {
    queued: HashMap<String, VecDeque<Result<Value, SdkError>>>,
    fixed: HashMap<String, Value>,
    log: Vec<RecordedRequest>,
}

/// In-memory node for tests.
///
/// Answers from, in order: responses queued for the method, a fixed response
/// set for the method, then built-in defaults that behave like a node which
/// accepts and immediately mines every transaction. Clones share state, so a
/// test can keep a handle and inspect the request log after handing a clone
/// to the client.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer every call to `method` with `response`
    pub fn set_response(&self, method: &str, response: Value) {
        self.state().fixed.insert(method.to_string(), response);
    }

    /// Answer the next call to `method` with `response`
    pub fn push_response(&self, method: &str, response: Value) {
        self.state()
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(response));
    }

    /// Fail the next call to `method` with an RPC error
    pub fn push_error(&self, method: &str, code: i64, message: &str) {
        self.state()
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(Err(SdkError::Rpc {
                code,
                message: message.to_string(),
            }));
    }

    /// Clear custom responses
    pub fn clear_responses(&self) {
        let mut state = self.state();
        state.queued.clear();
        state.fixed.clear();
    }

    /// Every request seen so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state().log.clone()
    }

    /// Methods of every request seen so far, in order
    pub fn methods(&self) -> Vec<String> {
        self.state().log.iter().map(|r| r.method.clone()).collect()
    }

    fn default_response(method: &str, params: &[Value]) -> Option<Value> {
        let first = params.first().and_then(Value::as_str).unwrap_or_default();
        let value = match method {
            "eth_chainId" => json!("0x1"),
            "eth_gasPrice" => json!("0x3b9aca00"),
            "eth_blockNumber" => json!("0x10"),
            "eth_getTransactionCount" => json!("0x0"),
            // (bool success = true, uint256 = 0)
            "eth_call" => json!(format!("0x{:0>64}{:0>64}", "1", "0")),
            "eth_sendRawTransaction" => {
                let raw = hex::decode(exo_primitives::strip_hex_prefix(first)).ok()?;
                json!(exo_crypto::keccak256(&raw).to_hex())
            }
            "eth_getTransactionByHash" => json!({
                "hash": first,
                "nonce": "0x0",
                "blockNumber": "0x10",
                "input": "0x",
            }),
            "eth_getTransactionReceipt" => json!({
                "transactionHash": first,
                "status": "0x1",
                "blockNumber": "0x10",
                "gasUsed": "0x5208",
                "cumulativeGasUsed": "0x5208",
                "logs": [],
            }),
            _ => return None,
        };
        Some(value)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError> {
        let mut state = self.state();
        state.log.push(RecordedRequest {
            method: method.to_string(),
            params: params.clone(),
        });

        if let Some(response) = state.queued.get_mut(method).and_then(VecDeque::pop_front) {
            return response;
        }
        if let Some(response) = state.fixed.get(method) {
            return Ok(response.clone());
        }

        Self::default_response(method, &params).ok_or_else(|| SdkError::Rpc {
            code: -32601,
            message: format!("Method not found: {}", method),
        })
    }
}

/// HTTP transport for real RPC communication
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
    url: reqwest::Url,
    request_id: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a new HTTP transport; fails on a malformed URL
    pub fn new(url: &str, timeout: std::time::Duration) -> Result<Self, SdkError> {
        let url = reqwest::Url::parse(url).map_err(|e| SdkError::connection("endpoint", e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SdkError::connection(
                "endpoint",
                format!("unsupported scheme `{}`", url.scheme()),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SdkError::connection("endpoint", e))?;
        Ok(Self {
            client,
            url,
            request_id: std::sync::atomic::AtomicU64::new(1),
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    fn next_id(&self) -> u64 {
        self.request_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError> {
        let id = self.next_id();
        tracing::debug!(method, id, "rpc request");
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?;

        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(SdkError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        // `null` is a legitimate result (unknown tx, receipt not yet available)
        Ok(response.result.unwrap_or(Value::Null))
    }
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_default_responses() {
        let transport = MockTransport::new();

        let result = transport.request_json("eth_chainId", vec![]).await.unwrap();
        assert_eq!(result, json!("0x1"));

        let result = transport.request_json("eth_gasPrice", vec![]).await.unwrap();
        assert_eq!(result, json!("0x3b9aca00"));
    }

    #[tokio::test]
    async fn test_mock_transport_queue_then_fixed() {
        let transport = MockTransport::new();
        transport.set_response("eth_chainId", json!("0x5"));
        transport.push_response("eth_chainId", json!("0x7"));

        let first = transport.request_json("eth_chainId", vec![]).await.unwrap();
        let second = transport.request_json("eth_chainId", vec![]).await.unwrap();
        assert_eq!(first, json!("0x7"));
        assert_eq!(second, json!("0x5"));
    }

    #[tokio::test]
    async fn test_mock_transport_queued_error() {
        let transport = MockTransport::new();
        transport.push_error("eth_sendRawTransaction", -32000, "nonce too low");
        let err = transport
            .request_json("eth_sendRawTransaction", vec![json!("0x00")])
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::Rpc { code: -32000, .. }));
    }

    #[tokio::test]
    async fn test_mock_transport_records_requests() {
        let transport = MockTransport::new();
        let handle = transport.clone();
        transport.request_json("eth_chainId", vec![]).await.unwrap();
        transport
            .request_json("eth_getTransactionCount", vec![json!("0xabc"), json!("latest")])
            .await
            .unwrap();
        assert_eq!(handle.methods(), vec!["eth_chainId", "eth_getTransactionCount"]);
        assert_eq!(handle.requests()[1].params[1], json!("latest"));
    }

    #[tokio::test]
    async fn test_mock_send_raw_returns_keccak() {
        let transport = MockTransport::new();
        let result = transport
            .request_json("eth_sendRawTransaction", vec![json!("0xc0")])
            .await
            .unwrap();
        assert_eq!(
            result,
            json!("0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347")
        );
    }

    #[tokio::test]
    async fn test_mock_transport_unknown_method() {
        let transport = MockTransport::new();
        assert!(transport.request_json("unknown_method", vec![]).await.is_err());
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_transport_rejects_bad_url() {
        let timeout = std::time::Duration::from_secs(1);
        assert!(HttpTransport::new("not a url", timeout).is_err());
        assert!(HttpTransport::new("ftp://node:21", timeout).is_err());
        assert!(HttpTransport::new("http://localhost:8545", timeout).is_ok());
    }
}
