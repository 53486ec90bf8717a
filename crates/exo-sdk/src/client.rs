//! ExoClient - JSON-RPC session with an Exocore node

use bytes::Bytes;
use exo_primitives::{strip_hex_prefix, Address, H256};
use exo_types::{Receipt, TransactionInfo};
use serde_json::Value;

use crate::transport::{deserialize_response, MockTransport, Transport};
use crate::types::{BlockId, CallRequest, RpcReceipt, RpcTransaction};
use crate::SdkError;

#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// RPC client for one endpoint.
///
/// Nothing is cached: chain id and nonce are read fresh on every call.
pub struct ExoClient {
    transport: Box<dyn Transport>,
    endpoint: String,
}

impl ExoClient {
    /// Create a client with HTTP transport.
    ///
    /// Only the URL is validated here; the first RPC call is the first
    /// network round trip.
    #[cfg(feature = "http")]
    pub fn connect(url: &str, request_timeout: std::time::Duration) -> Result<Self, SdkError> {
        let transport = HttpTransport::new(url, request_timeout)?;
        let endpoint = transport.url().to_string();
        Ok(Self {
            transport: Box::new(transport),
            endpoint,
        })
    }

    /// Create a new client with mock transport (for testing)
    pub fn new_mock() -> Self {
        Self::with_transport(MockTransport::new())
    }

    /// Create a client with a custom transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            endpoint: "mock://".to_string(),
        }
    }

    /// Endpoint this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, SdkError> {
        let value = self.transport.request_json(method, params).await?;
        deserialize_response(value)
    }

    // ==================== Chain Info ====================

    /// `eth_chainId`
    pub async fn chain_id(&self) -> Result<u64, SdkError> {
        let result: String = self.request("eth_chainId", vec![]).await?;
        parse_hex_u64(&result)
    }

    /// `eth_gasPrice`
    pub async fn gas_price(&self) -> Result<u128, SdkError> {
        let result: String = self.request("eth_gasPrice", vec![]).await?;
        parse_hex_u128(&result)
    }

    /// `eth_blockNumber`
    pub async fn block_number(&self) -> Result<u64, SdkError> {
        let result: String = self.request("eth_blockNumber", vec![]).await?;
        parse_hex_u64(&result)
    }

    // ==================== Account Queries ====================

    /// Transaction count of `address` at `block`
    pub async fn get_nonce(&self, address: &Address, block: BlockId) -> Result<u64, SdkError> {
        let result: String = self
            .request(
                "eth_getTransactionCount",
                vec![
                    Value::String(address.to_hex()),
                    serde_json::to_value(block)?,
                ],
            )
            .await?;
        parse_hex_u64(&result)
    }

    // ==================== Transactions ====================

    /// Broadcast raw signed bytes; returns the hash reported by the node
    pub async fn send_raw_transaction(&self, tx: &[u8]) -> Result<H256, SdkError> {
        let hex = format!("0x{}", hex::encode(tx));
        let result: String = self
            .request("eth_sendRawTransaction", vec![Value::String(hex)])
            .await?;
        Ok(H256::from_hex(&result)?)
    }

    /// Look a transaction up by hash; `None` when the node does not know it
    pub async fn get_transaction(&self, hash: &H256) -> Result<Option<TransactionInfo>, SdkError> {
        let result: Option<RpcTransaction> = self
            .request("eth_getTransactionByHash", vec![Value::String(hash.to_hex())])
            .await?;
        result.map(TransactionInfo::try_from).transpose()
    }

    /// Receipt of a mined transaction; `None` while not yet mined
    pub async fn get_receipt(&self, hash: &H256) -> Result<Option<Receipt>, SdkError> {
        let result: Option<RpcReceipt> = self
            .request(
                "eth_getTransactionReceipt",
                vec![Value::String(hash.to_hex())],
            )
            .await?;
        result.map(Receipt::try_from).transpose()
    }

    // ==================== Call ====================

    /// Execute a call without creating a transaction
    pub async fn call(&self, request: &CallRequest, block: BlockId) -> Result<Bytes, SdkError> {
        let result: String = self
            .request(
                "eth_call",
                vec![serde_json::to_value(request)?, serde_json::to_value(block)?],
            )
            .await?;
        parse_hex_bytes(&result)
    }
}

impl std::fmt::Debug for ExoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExoClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

// ==================== Helper Functions ====================

pub(crate) fn parse_hex_u64(s: &str) -> Result<u64, SdkError> {
    u64::from_str_radix(strip_hex_prefix(s), 16).map_err(|e| SdkError::InvalidHex(e.to_string()))
}

pub(crate) fn parse_hex_u128(s: &str) -> Result<u128, SdkError> {
    u128::from_str_radix(strip_hex_prefix(s), 16).map_err(|e| SdkError::InvalidHex(e.to_string()))
}

pub(crate) fn parse_hex_bytes(s: &str) -> Result<Bytes, SdkError> {
    let s = strip_hex_prefix(s);
    if s.is_empty() {
        return Ok(Bytes::new());
    }
    let bytes = hex::decode(s)?;
    Ok(Bytes::from(bytes))
}
