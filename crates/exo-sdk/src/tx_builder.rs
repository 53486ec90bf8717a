//! Transaction builder

use bytes::Bytes;
use exo_primitives::Address;
use exo_types::{LegacyTx, SignedTransaction, TxSignature};

use crate::{SdkError, Wallet};

/// Legacy transaction builder with fluent API.
///
/// Precompile calls never transfer value, so there is no value setter.
#[derive(Debug, Clone, Default)]
pub struct TxBuilder {
    chain_id: u64,
    nonce: Option<u64>,
    gas_limit: Option<u64>,
    gas_price: Option<u128>,
    to: Option<Address>,
    data: Bytes,
}

impl TxBuilder {
    /// Create a new transaction builder
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ..Default::default()
        }
    }

    /// Set the nonce
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the gas limit
    pub fn gas_limit(mut self, limit: u64) -> Self {
        self.gas_limit = Some(limit);
        self
    }

    /// Set the gas price
    pub fn gas_price(mut self, price: u128) -> Self {
        self.gas_price = Some(price);
        self
    }

    /// Set the recipient address
    pub fn to(mut self, address: Address) -> Self {
        self.to = Some(address);
        self
    }

    /// Set the input data
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    /// Build the unsigned transaction
    pub fn build_legacy(&self) -> Result<LegacyTx, SdkError> {
        let nonce = self.nonce.ok_or(SdkError::MissingField("nonce".to_string()))?;
        let gas_limit = self.gas_limit.ok_or(SdkError::MissingField("gas_limit".to_string()))?;
        let gas_price = self.gas_price.ok_or(SdkError::MissingField("gas_price".to_string()))?;
        let to = self.to.ok_or(SdkError::MissingField("to".to_string()))?;

        Ok(LegacyTx {
            nonce,
            gas_price,
            gas_limit,
            to: Some(to),
            value: 0,
            data: self.data.clone(),
        })
    }

    /// Sign with EIP-155 replay protection
    ///
    /// # Errors
    ///
    /// - a required field is missing (nonce, gas limit, gas price, recipient)
    /// - chain id is 0
    pub fn sign_legacy(&self, wallet: &Wallet) -> Result<SignedTransaction, SdkError> {
        if self.chain_id == 0 {
            return Err(SdkError::Signature(
                "chain id 0 cannot be signed for".to_string(),
            ));
        }
        let tx = self.build_legacy()?;
        let hash = tx.signing_hash(self.chain_id);
        let signature = wallet.sign_hash(&hash)?;
        let signature = TxSignature::from_recoverable(&signature, self.chain_id);
        Ok(SignedTransaction::new(tx, signature))
    }
}
