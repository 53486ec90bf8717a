//! SDK types

use bytes::Bytes;
use exo_primitives::{Address, H256, U256};
use exo_types::{Log, Receipt, TransactionInfo};
use serde::{Deserialize, Serialize};

use crate::client::{parse_hex_bytes, parse_hex_u64};
use crate::SdkError;

/// Block identifier for RPC queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockId {
    /// Block number
    Number(u64),
    /// Latest block
    #[default]
    Latest,
    /// Pending block (includes pending transactions)
    Pending,
}

impl Serialize for BlockId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            BlockId::Number(n) => serializer.serialize_str(&format!("0x{:x}", n)),
            BlockId::Latest => serializer.serialize_str("latest"),
            BlockId::Pending => serializer.serialize_str("pending"),
        }
    }
}

/// Call request for `eth_call`
#[derive(Debug, Clone, Default)]
pub struct CallRequest {
    /// Sender address
    pub from: Option<Address>,
    /// Recipient address
    pub to: Option<Address>,
    /// Gas limit
    pub gas: Option<u64>,
    /// Gas price
    pub gas_price: Option<u128>,
    /// Value to transfer
    pub value: Option<U256>,
    /// Input data
    pub data: Option<Bytes>,
}

impl Serialize for CallRequest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let count = [
            self.from.is_some(),
            self.to.is_some(),
            self.gas.is_some(),
            self.gas_price.is_some(),
            self.value.is_some(),
            self.data.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();

        let mut map = serializer.serialize_map(Some(count))?;

        if let Some(from) = &self.from {
            map.serialize_entry("from", &from.to_hex())?;
        }
        if let Some(to) = &self.to {
            map.serialize_entry("to", &to.to_hex())?;
        }
        if let Some(gas) = &self.gas {
            map.serialize_entry("gas", &format!("0x{:x}", gas))?;
        }
        if let Some(gas_price) = &self.gas_price {
            map.serialize_entry("gasPrice", &format!("0x{:x}", gas_price))?;
        }
        if let Some(value) = &self.value {
            map.serialize_entry("value", &format!("0x{:x}", value))?;
        }
        if let Some(data) = &self.data {
            map.serialize_entry("data", &format!("0x{}", hex::encode(data)))?;
        }

        map.end()
    }
}

/// Receipt as returned by `eth_getTransactionReceipt`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcReceipt {
    transaction_hash: String,
    status: Option<String>,
    block_number: Option<String>,
    block_hash: Option<String>,
    gas_used: Option<String>,
    cumulative_gas_used: Option<String>,
    #[serde(default)]
    logs: Vec<RpcLog>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RpcLog {
    address: String,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    data: String,
}

impl TryFrom<RpcReceipt> for Receipt {
    type Error = SdkError;

    fn try_from(raw: RpcReceipt) -> Result<Self, Self::Error> {
        let status = raw
            .status
            .as_deref()
            .ok_or_else(|| SdkError::MissingField("status".into()))?;
        let block_number = raw
            .block_number
            .as_deref()
            .ok_or_else(|| SdkError::MissingField("blockNumber".into()))?;
        let logs = raw
            .logs
            .into_iter()
            .map(|log| {
                Ok(Log {
                    address: Address::from_hex(&log.address)?,
                    topics: log
                        .topics
                        .iter()
                        .map(|t| H256::from_hex(t))
                        .collect::<Result<_, _>>()?,
                    data: parse_hex_bytes(&log.data)?,
                })
            })
            .collect::<Result<Vec<_>, SdkError>>()?;

        Ok(Receipt {
            transaction_hash: H256::from_hex(&raw.transaction_hash)?,
            status: parse_hex_u64(status)?,
            block_number: parse_hex_u64(block_number)?,
            block_hash: raw.block_hash.as_deref().map(H256::from_hex).transpose()?,
            gas_used: optional_u64(raw.gas_used.as_deref())?,
            cumulative_gas_used: optional_u64(raw.cumulative_gas_used.as_deref())?,
            logs,
        })
    }
}

/// Transaction as returned by `eth_getTransactionByHash`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcTransaction {
    hash: String,
    from: Option<String>,
    to: Option<String>,
    nonce: Option<String>,
    block_number: Option<String>,
    #[serde(default)]
    input: String,
}

impl TryFrom<RpcTransaction> for TransactionInfo {
    type Error = SdkError;

    fn try_from(raw: RpcTransaction) -> Result<Self, Self::Error> {
        Ok(TransactionInfo {
            hash: H256::from_hex(&raw.hash)?,
            from: raw.from.as_deref().map(Address::from_hex).transpose()?,
            to: raw.to.as_deref().map(Address::from_hex).transpose()?,
            nonce: optional_u64(raw.nonce.as_deref())?,
            block_number: raw.block_number.as_deref().map(parse_hex_u64).transpose()?,
            input: parse_hex_bytes(&raw.input)?,
        })
    }
}

fn optional_u64(value: Option<&str>) -> Result<u64, SdkError> {
    value.map(parse_hex_u64).transpose().map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_id_serialize() {
        assert_eq!(serde_json::to_value(BlockId::Latest).unwrap(), json!("latest"));
        assert_eq!(serde_json::to_value(BlockId::Number(255)).unwrap(), json!("0xff"));
    }

    #[test]
    fn test_call_request_omits_unset_fields() {
        let request = CallRequest {
            to: Some(Address::from_low_u16(0x0804)),
            data: Some(Bytes::from_static(&[0xde, 0xad])),
            value: Some(U256::zero()),
            ..Default::default()
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "to": "0x0000000000000000000000000000000000000804",
                "data": "0xdead",
                "value": "0x0",
            })
        );
    }

    #[test]
    fn test_receipt_conversion() {
        let hash = format!("0x{}", "ab".repeat(32));
        let raw: RpcReceipt = serde_json::from_value(json!({
            "transactionHash": hash,
            "status": "0x0",
            "blockNumber": "0x1b4",
            "gasUsed": "0x5208",
            "logs": [{
                "address": "0x0000000000000000000000000000000000000805",
                "topics": [hash],
                "data": "0x01"
            }],
        }))
        .unwrap();
        let receipt = Receipt::try_from(raw).unwrap();
        assert_eq!(receipt.status, 0);
        assert_eq!(receipt.block_number, 436);
        assert_eq!(receipt.gas_used, 21000);
        assert_eq!(receipt.cumulative_gas_used, 0);
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].data.as_ref(), &[1]);
    }

    #[test]
    fn test_receipt_requires_status() {
        let raw: RpcReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "00".repeat(32)),
            "blockNumber": "0x1",
        }))
        .unwrap();
        assert!(matches!(
            Receipt::try_from(raw),
            Err(SdkError::MissingField(field)) if field == "status"
        ));
    }

    #[test]
    fn test_pending_transaction_conversion() {
        let raw: RpcTransaction = serde_json::from_value(json!({
            "hash": format!("0x{}", "11".repeat(32)),
            "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "to": null,
            "nonce": "0x2a",
            "blockNumber": null,
            "input": "0x",
        }))
        .unwrap();
        let info = TransactionInfo::try_from(raw).unwrap();
        assert!(info.is_pending());
        assert_eq!(info.nonce, 42);
        assert!(info.to.is_none());
        assert!(info.input.is_empty());
    }
}
