//! CLI error types

use exo_primitives::{Address, H256};
use exo_sdk::{DispatchError, SdkError};
use thiserror::Error;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Operation failed somewhere in the pipeline
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// SDK error outside a dispatched operation
    #[error(transparent)]
    Sdk(#[from] SdkError),

    /// No signing key on the command line or in the environment
    #[error("Missing private key: pass --private-key or set EXO_PRIVATE_KEY")]
    MissingKey,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),
}

impl CliError {
    /// Transaction id worth reporting alongside the error
    pub fn tx_hash(&self) -> Option<H256> {
        match self {
            CliError::Dispatch(e) => e.tx_hash,
            CliError::Sdk(e) => e.tx_hash(),
            _ => None,
        }
    }

    /// Precompile the failed operation was aimed at
    pub fn destination(&self) -> Option<Address> {
        match self {
            CliError::Dispatch(e) => e.destination,
            _ => None,
        }
    }

    /// Pipeline stage the failure happened after
    pub fn stage(&self) -> Option<String> {
        match self {
            CliError::Dispatch(e) => Some(e.stage.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exo_sdk::PipelineStage;
    use std::time::Duration;

    #[test]
    fn test_dispatch_error_exposes_hash_and_stage() {
        let hash = H256::from_bytes([9; 32]);
        let err = CliError::from(DispatchError {
            operation: "delegate".into(),
            destination: Some(Address::from_low_u16(0x0805)),
            stage: PipelineStage::TimedOut,
            tx_hash: Some(hash),
            source: SdkError::Timeout {
                tx_hash: hash,
                waited: Duration::from_secs(300),
            },
        });
        assert_eq!(err.tx_hash(), Some(hash));
        assert_eq!(err.stage().as_deref(), Some("timed-out"));
        assert_eq!(err.destination(), Some(Address::from_low_u16(0x0805)));
        assert!(err.to_string().starts_with(
            "delegate at 0x0000000000000000000000000000000000000805 failed after stage timed-out"
        ));
    }

    #[test]
    fn test_plain_errors_have_no_hash() {
        assert!(CliError::MissingKey.tx_hash().is_none());
        assert!(CliError::MissingKey.destination().is_none());
        assert!(CliError::Config("bad".into()).stage().is_none());
    }
}
