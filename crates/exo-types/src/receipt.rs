//! What the node reports about a submitted transaction

use bytes::Bytes;
use exo_primitives::{Address, H256};

/// Execution status of a mined transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// Reverted or otherwise failed
    Failure,
    /// Succeeded
    Success,
}

impl From<bool> for TxStatus {
    fn from(success: bool) -> Self {
        if success {
            TxStatus::Success
        } else {
            TxStatus::Failure
        }
    }
}

/// Log entry emitted during execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics
    pub topics: Vec<H256>,
    /// Non-indexed data
    pub data: Bytes,
}

/// Mined transaction receipt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction id
    pub transaction_hash: H256,
    /// Raw status code; 1 is success
    pub status: u64,
    /// Block that included the transaction
    pub block_number: u64,
    /// Hash of that block, when reported
    pub block_hash: Option<H256>,
    /// Gas used by this transaction
    pub gas_used: u64,
    /// Cumulative gas used in the block
    pub cumulative_gas_used: u64,
    /// Emitted logs
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Status code 1
    pub fn is_success(&self) -> bool {
        self.status == 1
    }

    /// Status as an enum
    pub fn tx_status(&self) -> TxStatus {
        TxStatus::from(self.is_success())
    }
}

/// Result of `eth_getTransactionByHash`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionInfo {
    /// Transaction id
    pub hash: H256,
    /// Sender
    pub from: Option<Address>,
    /// Recipient
    pub to: Option<Address>,
    /// Sender nonce
    pub nonce: u64,
    /// Inclusion block; `None` while pending
    pub block_number: Option<u64>,
    /// Call data
    pub input: Bytes,
}

impl TransactionInfo {
    /// Not yet included in a block
    pub fn is_pending(&self) -> bool {
        self.block_number.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(status: u64) -> Receipt {
        Receipt {
            transaction_hash: H256::from_bytes([1; 32]),
            status,
            block_number: 10,
            block_hash: None,
            gas_used: 21000,
            cumulative_gas_used: 21000,
            logs: vec![],
        }
    }

    #[test]
    fn test_receipt_status() {
        assert!(receipt(1).is_success());
        assert_eq!(receipt(1).tx_status(), TxStatus::Success);
        assert!(!receipt(0).is_success());
        assert!(!receipt(2).is_success());
        assert_eq!(receipt(0).tx_status(), TxStatus::Failure);
    }

    #[test]
    fn test_transaction_info_pending() {
        let mut info = TransactionInfo {
            hash: H256::ZERO,
            from: None,
            to: Some(Address::from_low_u16(0x0804)),
            nonce: 3,
            block_number: None,
            input: Bytes::new(),
        };
        assert!(info.is_pending());
        info.block_number = Some(5);
        assert!(!info.is_pending());
    }
}
