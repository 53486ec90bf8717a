//! Subcommands and the state they share

pub mod query;
pub mod staking;

use std::sync::Arc;

use exo_sdk::abi::Token;
use exo_sdk::{Dispatcher, ExoClient, PipelineSettings, SchemaRegistry};
use serde_json::Value;

use crate::{config::Config, CliError};

/// Effective configuration of one CLI run, after flags are applied
pub struct Session {
    /// Merged configuration
    pub config: Config,
    /// Pipeline knobs
    pub settings: PipelineSettings,
    /// `--json`
    pub json: bool,
    /// Hex signing key, if one was given
    pub private_key: Option<String>,
    /// Wait for the receipt after broadcasting
    pub wait: bool,
}

impl Session {
    /// Dispatcher over the configured schemas
    pub fn dispatcher(&self) -> Result<Dispatcher, CliError> {
        let registry = SchemaRegistry::new(&self.config.to_selection()?)?;
        Ok(Dispatcher::new(Arc::new(registry), self.settings))
    }

    /// RPC client for the configured endpoint
    pub fn client(&self) -> Result<ExoClient, CliError> {
        Ok(ExoClient::connect(
            &self.config.rpc_url,
            self.settings.request_timeout,
        )?)
    }

    /// The signing key or [`CliError::MissingKey`]
    pub fn private_key(&self) -> Result<&str, CliError> {
        self.private_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(CliError::MissingKey)
    }
}

/// JSON rendering of a decoded ABI value; integers become decimal strings
pub fn token_to_json(token: &Token) -> Value {
    match token {
        Token::Address(a) => Value::String(a.to_hex()),
        Token::Uint(v) => Value::String(v.to_string()),
        Token::Bool(b) => Value::Bool(*b),
        Token::Bytes(b) | Token::FixedBytes(b) => Value::String(format!("0x{}", hex::encode(b))),
        Token::String(s) => Value::String(s.clone()),
        Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => {
            Value::Array(items.iter().map(token_to_json).collect())
        }
    }
}

/// One-line text rendering of a decoded ABI value
pub fn token_to_text(token: &Token) -> String {
    match token_to_json(token) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exo_primitives::{Address, U256};
    use serde_json::json;

    #[test]
    fn test_token_to_json() {
        let token = Token::Tuple(vec![
            Token::Bool(true),
            Token::Array(vec![Token::uint(101), Token::Uint(U256::MAX)]),
            Token::Address(Address::from_low_u16(0x0804)),
            Token::Bytes(vec![0xab, 0xcd]),
        ]);
        assert_eq!(
            token_to_json(&token),
            json!([
                true,
                ["101", U256::MAX.to_string()],
                "0x0000000000000000000000000000000000000804",
                "0xabcd"
            ])
        );
    }

    #[test]
    fn test_token_to_text() {
        assert_eq!(token_to_text(&Token::uint(7)), "7");
        assert_eq!(token_to_text(&Token::Bool(false)), "false");
        assert_eq!(
            token_to_text(&Token::Array(vec![Token::uint(1), Token::uint(2)])),
            "[\"1\",\"2\"]"
        );
    }

    #[test]
    fn test_missing_key() {
        let session = Session {
            config: Config::default(),
            settings: PipelineSettings::default(),
            json: false,
            private_key: Some("  ".into()),
            wait: true,
        };
        assert!(matches!(session.private_key(), Err(CliError::MissingKey)));
    }
}
