//! SDK error types

use std::time::Duration;

use exo_primitives::{Address, H256};
use thiserror::Error;

use crate::dispatcher::PipelineStage;

/// SDK error type
#[derive(Debug, Error)]
pub enum SdkError {
    /// An argument could not be canonicalized or does not fit the schema
    #[error("invalid input: {0}")]
    InputEncoding(String),

    /// No schema entry for the requested operation
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A pre-signing RPC (chain id, nonce, gas price) or endpoint setup failed
    #[error("failed to fetch {what}: {reason}")]
    Connection {
        /// What was being fetched
        what: String,
        /// Underlying failure
        reason: String,
    },

    /// Signing failed or the chain id cannot be signed for
    #[error("signing failed: {0}")]
    Signature(String),

    /// The node rejected the raw transaction
    #[error("broadcast rejected: {0}")]
    Broadcast(String),

    /// Dry run failed under the abort policy
    #[error("simulation rejected the call: {0}")]
    SimulationRejected(String),

    /// The node does not know the transaction
    #[error("transaction {0} not found")]
    NotFound(H256),

    /// Mined with a non-success status
    #[error("transaction {tx_hash} failed with status {status}")]
    TransactionFailed {
        /// Transaction id
        tx_hash: H256,
        /// Receipt status code
        status: u64,
    },

    /// No receipt before the deadline
    #[error("transaction {tx_hash} not mined within {waited:?}")]
    Timeout {
        /// Transaction id
        tx_hash: H256,
        /// How long we waited
        waited: Duration,
    },

    /// Transport/network error
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON-RPC error object returned by the node
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },

    /// Invalid hex string
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Return data could not be decoded
    #[error("abi decoding error: {0}")]
    AbiDecode(String),

    /// Invalid private key
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(String),
}

impl SdkError {
    /// Wrap a lower-level failure as a [`SdkError::Connection`]
    pub fn connection(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        SdkError::Connection {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Transaction id carried by the error, if any
    pub fn tx_hash(&self) -> Option<H256> {
        match self {
            SdkError::NotFound(hash) => Some(*hash),
            SdkError::TransactionFailed { tx_hash, .. } | SdkError::Timeout { tx_hash, .. } => {
                Some(*tx_hash)
            }
            _ => None,
        }
    }
}

impl From<hex::FromHexError> for SdkError {
    fn from(e: hex::FromHexError) -> Self {
        SdkError::InvalidHex(e.to_string())
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::Serialization(e.to_string())
    }
}

impl From<exo_crypto::CryptoError> for SdkError {
    fn from(e: exo_crypto::CryptoError) -> Self {
        SdkError::Signature(e.to_string())
    }
}

impl From<exo_primitives::AddressError> for SdkError {
    fn from(e: exo_primitives::AddressError) -> Self {
        SdkError::InputEncoding(e.to_string())
    }
}

impl From<exo_primitives::HashError> for SdkError {
    fn from(e: exo_primitives::HashError) -> Self {
        SdkError::InvalidHex(e.to_string())
    }
}

/// Failure of one dispatched operation, annotated with pipeline context
#[derive(Debug, Error)]
#[error(
    "{operation}{} failed after stage {stage}{}: {source}",
    destination_note(.destination),
    tx_note(.tx_hash)
)]
pub struct DispatchError {
    /// Operation name as typed on the command line
    pub operation: String,
    /// Precompile the call was aimed at, once resolved
    pub destination: Option<Address>,
    /// Last stage reached
    pub stage: PipelineStage,
    /// Transaction id, once signed
    pub tx_hash: Option<H256>,
    /// Underlying error
    pub source: SdkError,
}

fn destination_note(destination: &Option<Address>) -> String {
    match destination {
        Some(address) => format!(" at {}", address),
        None => String::new(),
    }
}

fn tx_note(tx_hash: &Option<H256>) -> String {
    match tx_hash {
        Some(hash) => format!(" (tx {})", hash),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_hash_carried_by_terminal_errors() {
        let hash = H256::from_bytes([7; 32]);
        assert_eq!(SdkError::NotFound(hash).tx_hash(), Some(hash));
        assert_eq!(
            SdkError::TransactionFailed { tx_hash: hash, status: 0 }.tx_hash(),
            Some(hash)
        );
        assert_eq!(SdkError::Broadcast("nonce too low".into()).tx_hash(), None);
    }

    #[test]
    fn test_dispatch_error_display_includes_hash() {
        let hash = H256::from_bytes([1; 32]);
        let err = DispatchError {
            operation: "deposit".into(),
            destination: None,
            stage: PipelineStage::Broadcast,
            tx_hash: Some(hash),
            source: SdkError::Timeout {
                tx_hash: hash,
                waited: Duration::from_secs(1),
            },
        };
        let text = err.to_string();
        assert!(text.starts_with("deposit failed after stage broadcast"));
        assert!(text.contains(&hash.to_hex()));

        let err = DispatchError {
            destination: Some(Address::from_low_u16(0x0804)),
            ..err
        };
        assert!(err.to_string().starts_with(
            "deposit at 0x0000000000000000000000000000000000000804 failed after stage broadcast"
        ));
    }

    #[test]
    fn test_connection_helper() {
        let err = SdkError::connection("chain id", "connection refused");
        assert_eq!(err.to_string(), "failed to fetch chain id: connection refused");
    }
}
