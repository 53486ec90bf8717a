//! ABI encoding

use exo_primitives::U256;

use super::function::FunctionDef;
use super::types::{ParamType, Token};
use crate::SdkError;

/// Encode a validated call: selector followed by the ABI body
///
/// Fails with [`SdkError::InputEncoding`] when the argument count differs
/// from the declared arity or any argument does not match its declared type
/// (checked recursively through tuples and arrays).
pub fn encode_call(function: &FunctionDef, args: &[Token]) -> Result<Vec<u8>, SdkError> {
    if args.len() != function.inputs.len() {
        return Err(SdkError::InputEncoding(format!(
            "{}: expected {} arguments, got {}",
            function.name,
            function.inputs.len(),
            args.len()
        )));
    }
    for (param, token) in function.inputs.iter().zip(args) {
        check_token(&param.kind, token).map_err(|reason| {
            SdkError::InputEncoding(format!(
                "{}: parameter `{}`: {}",
                function.name, param.name, reason
            ))
        })?;
    }

    let types = function.input_types();
    let mut data = function.selector.to_vec();
    data.extend(encode_params(&types, args));
    Ok(data)
}

/// Encode tokens against explicit types (no selector)
pub fn encode(types: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, SdkError> {
    if types.len() != tokens.len() {
        return Err(SdkError::InputEncoding(format!(
            "expected {} values, got {}",
            types.len(),
            tokens.len()
        )));
    }
    for (i, (kind, token)) in types.iter().zip(tokens).enumerate() {
        check_token(kind, token)
            .map_err(|reason| SdkError::InputEncoding(format!("value {}: {}", i, reason)))?;
    }
    Ok(encode_params(types, tokens))
}

/// First 4 bytes of keccak256 of the canonical signature
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = exo_crypto::keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

/// Check that `token` is a valid value of `kind`
pub(crate) fn check_token(kind: &ParamType, token: &Token) -> Result<(), String> {
    match (kind, token) {
        (ParamType::Address, Token::Address(_))
        | (ParamType::Bool, Token::Bool(_))
        | (ParamType::Bytes, Token::Bytes(_))
        | (ParamType::String, Token::String(_)) => Ok(()),
        (ParamType::Uint(bits), Token::Uint(value)) => {
            if value.bits() <= *bits {
                Ok(())
            } else {
                Err(format!("{} does not fit in uint{}", value, bits))
            }
        }
        (ParamType::FixedBytes(size), Token::FixedBytes(data)) => {
            if *size > 32 {
                Err(format!("bytes{} is wider than a word", size))
            } else if data.len() == *size {
                Ok(())
            } else {
                Err(format!("expected {} bytes, got {}", size, data.len()))
            }
        }
        (ParamType::Array(inner), Token::Array(items)) => check_items(inner, items),
        (ParamType::FixedArray(inner, size), Token::FixedArray(items)) => {
            if items.len() != *size {
                return Err(format!("expected {} elements, got {}", size, items.len()));
            }
            check_items(inner, items)
        }
        (ParamType::Tuple(types), Token::Tuple(items)) => {
            if types.len() != items.len() {
                return Err(format!(
                    "expected a {}-tuple, got {} fields",
                    types.len(),
                    items.len()
                ));
            }
            for (i, (t, item)) in types.iter().zip(items).enumerate() {
                check_token(t, item).map_err(|e| format!("field {}: {}", i, e))?;
            }
            Ok(())
        }
        _ => Err(format!("expected {}, got {}", kind, token.kind())),
    }
}

fn check_items(inner: &ParamType, items: &[Token]) -> Result<(), String> {
    for (i, item) in items.iter().enumerate() {
        check_token(inner, item).map_err(|e| format!("[{}]: {}", i, e))?;
    }
    Ok(())
}

/// Head/tail encoding; offsets are relative to the start of this block
fn encode_params(types: &[ParamType], tokens: &[Token]) -> Vec<u8> {
    let head_size: usize = types.iter().map(|t| t.head_length()).sum();

    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for (param_type, token) in types.iter().zip(tokens) {
        if param_type.is_dynamic() {
            head.extend(encode_word(&U256::from(head_size + tail.len())));
            tail.extend(encode_token(param_type, token));
        } else {
            head.extend(encode_token(param_type, token));
        }
    }

    head.extend(tail);
    head
}

fn encode_token(param_type: &ParamType, token: &Token) -> Vec<u8> {
    match (param_type, token) {
        (ParamType::Address, Token::Address(addr)) => {
            let mut buf = [0u8; 32];
            buf[12..].copy_from_slice(addr.as_bytes());
            buf.to_vec()
        }
        (ParamType::Uint(_), Token::Uint(value)) => encode_word(value),
        (ParamType::Bool, Token::Bool(b)) => encode_word(&U256::from(*b as u8)),
        (ParamType::FixedBytes(_), Token::FixedBytes(data)) => {
            let mut buf = [0u8; 32];
            buf[..data.len()].copy_from_slice(data);
            buf.to_vec()
        }
        (ParamType::Bytes, Token::Bytes(data)) => encode_bytes(data),
        (ParamType::String, Token::String(s)) => encode_bytes(s.as_bytes()),
        (ParamType::Array(inner), Token::Array(items)) => {
            let mut out = encode_word(&U256::from(items.len()));
            out.extend(encode_params(&vec![(**inner).clone(); items.len()], items));
            out
        }
        (ParamType::FixedArray(inner, size), Token::FixedArray(items)) => {
            encode_params(&vec![(**inner).clone(); *size], items)
        }
        (ParamType::Tuple(types), Token::Tuple(items)) => encode_params(types, items),
        // unreachable after check_token
        _ => vec![0u8; 32],
    }
}

fn encode_word(value: &U256) -> Vec<u8> {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    bytes.to_vec()
}

/// Length word followed by the data right-padded to a multiple of 32
fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let mut out = encode_word(&U256::from(data.len()));
    let padded_len = data.len().div_ceil(32) * 32;
    let start = out.len();
    out.resize(start + padded_len, 0);
    out[start..start + data.len()].copy_from_slice(data);
    out
}
