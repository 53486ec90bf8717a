//! Canonical byte encodings for identifiers and amounts
//!
//! Precompiles take addresses as variable-length `bytes`, but the chain keys
//! them as 32-byte values with the 20 address bytes first and zero padding
//! after (right-padded, unlike ABI `address` words).

use exo_primitives::{strip_hex_prefix, Address, U256};
use tracing::debug;

use crate::SdkError;

/// 20 address bytes followed by 12 zero bytes
pub fn pad_address_right(address: &Address) -> [u8; 32] {
    let mut padded = [0u8; 32];
    padded[..20].copy_from_slice(address.as_bytes());
    debug!(address = %address, padded = %hex::encode(padded), "padded address");
    padded
}

/// Canonicalize an asset/staker/withdrawer identifier.
///
/// A 20-byte hex value is right-padded to 32 bytes; a 32-byte value is taken
/// as already canonical. Any other length is rejected.
pub fn encode_identifier(input: &str) -> Result<Vec<u8>, SdkError> {
    let bytes = decode_hex(input)?;
    match bytes.len() {
        20 => {
            let address = Address::from_slice(&bytes)?;
            Ok(pad_address_right(&address).to_vec())
        }
        32 => Ok(bytes),
        n => Err(SdkError::InputEncoding(format!(
            "identifier `{}` is {} bytes; expected a 20-byte address or a 32-byte id",
            input, n
        ))),
    }
}

/// Parse a non-negative base-10 integer amount
pub fn parse_amount(input: &str) -> Result<U256, SdkError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SdkError::InputEncoding(format!(
            "amount `{}` is not a non-negative decimal integer",
            input
        )));
    }
    U256::from_dec_str(trimmed)
        .map_err(|_| SdkError::InputEncoding(format!("amount `{}` overflows uint256", input)))
}

/// Decode an arbitrary non-empty hex blob (validator ids, raw staker bytes)
pub fn decode_blob(input: &str) -> Result<Vec<u8>, SdkError> {
    let bytes = decode_hex(input)?;
    if bytes.is_empty() {
        return Err(SdkError::InputEncoding("empty hex value".to_string()));
    }
    Ok(bytes)
}

/// Operator addresses travel as the bytes of their bech32 string
pub fn operator_bytes(operator: &str) -> Result<Vec<u8>, SdkError> {
    let operator = operator.trim();
    let well_formed = operator
        .rsplit_once('1')
        .map(|(hrp, data)| !hrp.is_empty() && !data.is_empty())
        .unwrap_or(false)
        && operator.bytes().all(|b| b.is_ascii_alphanumeric());
    if !well_formed {
        return Err(SdkError::InputEncoding(format!(
            "operator `{}` is not a bech32 address",
            operator
        )));
    }
    Ok(operator.as_bytes().to_vec())
}

/// Empty or all-zero output: the "would fail" signal of a simulated call
pub fn is_zero_bytes(data: &[u8]) -> bool {
    data.iter().all(|b| *b == 0)
}

fn decode_hex(input: &str) -> Result<Vec<u8>, SdkError> {
    hex::decode(strip_hex_prefix(input.trim()))
        .map_err(|e| SdkError::InputEncoding(format!("`{}` is not valid hex: {}", input, e)))
}
