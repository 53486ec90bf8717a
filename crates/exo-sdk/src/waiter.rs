//! Confirmation polling

use std::time::Duration;

use exo_primitives::H256;
use exo_types::Receipt;
use tracing::{debug, info, warn};

use crate::{ExoClient, SdkError};

/// Default confirmation deadline
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(300);
/// Default receipt polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Waits for a broadcast transaction to be mined
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationWaiter {
    timeout: Duration,
    poll_interval: Duration,
}

impl Default for ConfirmationWaiter {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRM_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

impl ConfirmationWaiter {
    /// Create a waiter
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Deadline for one wait
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for the receipt of `tx_hash` and check its status.
    ///
    /// The node must know the transaction up front; an unknown hash is
    /// [`SdkError::NotFound`] without polling. Receipt lookup errors while
    /// polling are logged and retried until the deadline.
    pub async fn wait(&self, client: &ExoClient, tx_hash: H256) -> Result<Receipt, SdkError> {
        match client.get_transaction(&tx_hash).await? {
            None => return Err(SdkError::NotFound(tx_hash)),
            Some(info) if info.is_pending() => debug!(%tx_hash, "transaction pending"),
            Some(info) => debug!(%tx_hash, block = ?info.block_number, "transaction already included"),
        }

        let poll = async {
            loop {
                match client.get_receipt(&tx_hash).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => debug!(%tx_hash, "receipt not available yet"),
                    Err(e) => warn!(%tx_hash, error = %e, "receipt lookup failed"),
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        let receipt = tokio::time::timeout(self.timeout, poll)
            .await
            .map_err(|_| SdkError::Timeout {
                tx_hash,
                waited: self.timeout,
            })?;

        if !receipt.is_success() {
            return Err(SdkError::TransactionFailed {
                tx_hash,
                status: receipt.status,
            });
        }
        info!(%tx_hash, block = receipt.block_number, gas_used = receipt.gas_used, "transaction confirmed");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use serde_json::{json, Value};

    fn fast() -> ConfirmationWaiter {
        ConfirmationWaiter::new(Duration::from_millis(300), Duration::from_millis(20))
    }

    #[tokio::test]
    async fn test_wait_success() {
        let client = ExoClient::new_mock();
        let hash = H256::from_bytes([5; 32]);
        let receipt = fast().wait(&client, hash).await.unwrap();
        assert_eq!(receipt.transaction_hash, hash);
    }

    #[tokio::test]
    async fn test_wait_unknown_transaction() {
        let transport = MockTransport::new();
        transport.set_response("eth_getTransactionByHash", Value::Null);
        let client = ExoClient::with_transport(transport.clone());
        let hash = H256::from_bytes([5; 32]);
        assert!(matches!(
            fast().wait(&client, hash).await,
            Err(SdkError::NotFound(h)) if h == hash
        ));
        assert_eq!(transport.methods(), vec!["eth_getTransactionByHash"]);
    }

    #[tokio::test]
    async fn test_wait_retries_through_errors_and_nulls() {
        let transport = MockTransport::new();
        transport.push_error("eth_getTransactionReceipt", -32000, "busy");
        transport.push_response("eth_getTransactionReceipt", Value::Null);
        let client = ExoClient::with_transport(transport.clone());
        let receipt = fast().wait(&client, H256::from_bytes([6; 32])).await.unwrap();
        assert!(receipt.is_success());
        let polls = transport
            .methods()
            .iter()
            .filter(|m| *m == "eth_getTransactionReceipt")
            .count();
        assert_eq!(polls, 3);
    }

    #[tokio::test]
    async fn test_wait_failed_status() {
        let transport = MockTransport::new();
        let hash = H256::from_bytes([7; 32]);
        transport.set_response(
            "eth_getTransactionReceipt",
            json!({ "transactionHash": hash.to_hex(), "status": "0x0", "blockNumber": "0x2" }),
        );
        let client = ExoClient::with_transport(transport);
        assert!(matches!(
            fast().wait(&client, hash).await,
            Err(SdkError::TransactionFailed { status: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let transport = MockTransport::new();
        transport.set_response("eth_getTransactionReceipt", Value::Null);
        let client = ExoClient::with_transport(transport);
        let hash = H256::from_bytes([8; 32]);
        let err = fast().wait(&client, hash).await.unwrap_err();
        assert!(matches!(err, SdkError::Timeout { tx_hash, .. } if tx_hash == hash));
    }
}
