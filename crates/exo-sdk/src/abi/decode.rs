//! ABI decoding

use exo_primitives::{Address, U256};

use super::types::{ParamType, Token};
use crate::SdkError;

/// Decode ABI-encoded data (e.g. `eth_call` return data)
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, SdkError> {
    decode_params(types, data, 0)
}

/// Decode a head/tail block starting at `base`
fn decode_params(types: &[ParamType], data: &[u8], base: usize) -> Result<Vec<Token>, SdkError> {
    let mut tokens = Vec::with_capacity(types.len());
    let mut head = base;

    for param_type in types {
        let position = if param_type.is_dynamic() {
            let offset = read_usize(data, head)?;
            base.checked_add(offset)
                .ok_or_else(|| decode_error("offset overflow"))?
        } else {
            head
        };
        tokens.push(decode_value(param_type, data, position)?);
        head += param_type.head_length();
    }

    Ok(tokens)
}

/// Decode one value whose encoding starts at `pos`
fn decode_value(param_type: &ParamType, data: &[u8], pos: usize) -> Result<Token, SdkError> {
    match param_type {
        ParamType::Address => {
            let word = read_word(data, pos)?;
            if word[..12].iter().any(|b| *b != 0) {
                return Err(decode_error("address has dirty high bytes"));
            }
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&word[12..]);
            Ok(Token::Address(Address::from_bytes(bytes)))
        }
        ParamType::Uint(bits) => {
            let value = U256::from_big_endian(read_word(data, pos)?);
            if value.bits() > *bits {
                return Err(decode_error(&format!("value does not fit in uint{}", bits)));
            }
            Ok(Token::Uint(value))
        }
        ParamType::Bool => {
            let value = U256::from_big_endian(read_word(data, pos)?);
            if value > U256::one() {
                return Err(decode_error("bool is neither 0 nor 1"));
            }
            Ok(Token::Bool(!value.is_zero()))
        }
        ParamType::FixedBytes(size) => {
            let word = read_word(data, pos)?;
            let bytes = word
                .get(..*size)
                .ok_or_else(|| decode_error("fixed bytes wider than a word"))?;
            Ok(Token::FixedBytes(bytes.to_vec()))
        }
        ParamType::Bytes => Ok(Token::Bytes(read_bytes(data, pos)?.to_vec())),
        ParamType::String => {
            let bytes = read_bytes(data, pos)?;
            let s = String::from_utf8(bytes.to_vec())
                .map_err(|e| decode_error(&format!("invalid UTF-8: {}", e)))?;
            Ok(Token::String(s))
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, pos)?;
            // every element takes at least one word
            if len > data.len() / 32 {
                return Err(decode_error("array length exceeds data"));
            }
            let types = vec![(**inner).clone(); len];
            Ok(Token::Array(decode_params(&types, data, pos + 32)?))
        }
        ParamType::FixedArray(inner, size) => {
            let types = vec![(**inner).clone(); *size];
            Ok(Token::FixedArray(decode_params(&types, data, pos)?))
        }
        ParamType::Tuple(types) => Ok(Token::Tuple(decode_params(types, data, pos)?)),
    }
}

fn read_word(data: &[u8], pos: usize) -> Result<&[u8], SdkError> {
    let end = pos
        .checked_add(32)
        .ok_or_else(|| decode_error("offset overflow"))?;
    data.get(pos..end).ok_or_else(|| {
        decode_error(&format!(
            "need {} bytes, have {}",
            end,
            data.len()
        ))
    })
}

fn read_usize(data: &[u8], pos: usize) -> Result<usize, SdkError> {
    let value = U256::from_big_endian(read_word(data, pos)?);
    if value.bits() > 32 {
        return Err(decode_error("offset or length out of range"));
    }
    Ok(value.low_u64() as usize)
}

fn read_bytes(data: &[u8], pos: usize) -> Result<&[u8], SdkError> {
    let len = read_usize(data, pos)?;
    let start = pos + 32;
    data.get(start..start + len).ok_or_else(|| {
        decode_error(&format!(
            "need {} bytes, have {}",
            start + len,
            data.len()
        ))
    })
}

fn decode_error(reason: &str) -> SdkError {
    SdkError::AbiDecode(reason.to_string())
}
