//! Legacy (type 0) transactions with EIP-155 replay protection

use bytes::Bytes;
use exo_crypto::{keccak256, public_key_to_address, recover_public_key, CryptoError, Signature};
use exo_primitives::{Address, H256};
use rlp::{DecoderError, Rlp, RlpStream};
use thiserror::Error;

/// Errors raised while decoding or verifying a signed envelope
#[derive(Debug, Error)]
pub enum TxError {
    /// Malformed RLP
    #[error("rlp: {0}")]
    Rlp(#[from] DecoderError),

    /// `v` is not an EIP-155 value
    #[error("not an EIP-155 signature (v = {0})")]
    NotEip155(u64),

    /// Signature could not be recovered
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Unsigned legacy transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTx {
    /// Sender nonce
    pub nonce: u64,
    /// Gas price in wei
    pub gas_price: u128,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient (`None` would be a contract creation)
    pub to: Option<Address>,
    /// Value in wei
    pub value: u128,
    /// Call data
    pub data: Bytes,
}

impl Default for LegacyTx {
    fn default() -> Self {
        Self {
            nonce: 0,
            gas_price: 0,
            gas_limit: 21000,
            to: None,
            value: 0,
            data: Bytes::new(),
        }
    }
}

impl LegacyTx {
    fn append_fields(&self, s: &mut RlpStream) {
        s.append(&self.nonce);
        s.append(&trim_u128(self.gas_price));
        s.append(&self.gas_limit);
        match &self.to {
            Some(to) => s.append(to),
            None => s.append_empty_data(),
        };
        s.append(&trim_u128(self.value));
        s.append(&self.data.to_vec());
    }

    /// EIP-155 preimage: `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`
    pub fn encode_for_signing(&self, chain_id: u64) -> Vec<u8> {
        let mut s = RlpStream::new_list(9);
        self.append_fields(&mut s);
        s.append(&chain_id);
        s.append_empty_data();
        s.append_empty_data();
        s.out().to_vec()
    }

    /// Digest the sender signs
    pub fn signing_hash(&self, chain_id: u64) -> H256 {
        keccak256(&self.encode_for_signing(chain_id))
    }
}

/// `(v, r, s)` as carried in the envelope
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxSignature {
    /// `recovery_id + 35 + 2 * chain_id`
    pub v: u64,
    /// R component
    pub r: H256,
    /// S component
    pub s: H256,
}

impl TxSignature {
    /// Bind a recoverable signature to `chain_id`
    pub fn from_recoverable(sig: &Signature, chain_id: u64) -> Self {
        Self {
            v: sig.recovery_id as u64 + 35 + 2 * chain_id,
            r: H256::from_bytes(sig.r),
            s: H256::from_bytes(sig.s),
        }
    }

    /// Chain id encoded in `v`, if it is an EIP-155 value
    pub fn chain_id(&self) -> Option<u64> {
        (self.v >= 35).then(|| (self.v - 35) / 2)
    }

    fn recovery_id(&self) -> Option<u8> {
        (self.v >= 35).then(|| ((self.v - 35) % 2) as u8)
    }
}

/// Signed legacy transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Transaction body
    pub tx: LegacyTx,
    /// Signature
    pub signature: TxSignature,
}

impl SignedTransaction {
    /// Pair a body with its signature
    pub fn new(tx: LegacyTx, signature: TxSignature) -> Self {
        Self { tx, signature }
    }

    /// Raw bytes for `eth_sendRawTransaction`
    pub fn encode(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(9);
        self.tx.append_fields(&mut s);
        s.append(&self.signature.v);
        s.append(&trim_leading_zeros(self.signature.r.as_bytes()).to_vec());
        s.append(&trim_leading_zeros(self.signature.s.as_bytes()).to_vec());
        s.out().to_vec()
    }

    /// Transaction id: keccak of the signed envelope
    pub fn hash(&self) -> H256 {
        keccak256(&self.encode())
    }

    /// Decode a raw signed envelope
    pub fn decode(raw: &[u8]) -> Result<Self, TxError> {
        let rlp = Rlp::new(raw);
        if !rlp.is_list() {
            return Err(DecoderError::RlpExpectedToBeList.into());
        }
        if rlp.item_count()? != 9 {
            return Err(DecoderError::RlpIncorrectListLen.into());
        }

        let to_item = rlp.at(3)?;
        let to = if to_item.is_empty() {
            None
        } else {
            Some(to_item.as_val::<Address>()?)
        };

        let tx = LegacyTx {
            nonce: rlp.val_at(0)?,
            gas_price: u128_from_be(rlp.at(1)?.data()?)?,
            gas_limit: rlp.val_at(2)?,
            to,
            value: u128_from_be(rlp.at(4)?.data()?)?,
            data: Bytes::copy_from_slice(rlp.at(5)?.data()?),
        };
        let signature = TxSignature {
            v: rlp.val_at(6)?,
            r: h256_from_be(rlp.at(7)?.data()?)?,
            s: h256_from_be(rlp.at(8)?.data()?)?,
        };
        Ok(Self { tx, signature })
    }

    /// Recover the sender address from the signature
    pub fn recover_sender(&self) -> Result<Address, TxError> {
        let chain_id = self
            .signature
            .chain_id()
            .ok_or(TxError::NotEip155(self.signature.v))?;
        let recovery_id = self
            .signature
            .recovery_id()
            .ok_or(TxError::NotEip155(self.signature.v))?;
        let sig = Signature {
            r: *self.signature.r.as_bytes(),
            s: *self.signature.s.as_bytes(),
            recovery_id,
        };
        let public_key = recover_public_key(&self.tx.signing_hash(chain_id), &sig)?;
        Ok(public_key_to_address(&public_key))
    }
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

fn trim_u128(value: u128) -> Vec<u8> {
    trim_leading_zeros(&value.to_be_bytes()).to_vec()
}

fn u128_from_be(bytes: &[u8]) -> Result<u128, DecoderError> {
    if bytes.len() > 16 {
        return Err(DecoderError::RlpIsTooBig);
    }
    let mut buf = [0u8; 16];
    buf[16 - bytes.len()..].copy_from_slice(bytes);
    Ok(u128::from_be_bytes(buf))
}

fn h256_from_be(bytes: &[u8]) -> Result<H256, DecoderError> {
    if bytes.len() > 32 {
        return Err(DecoderError::RlpIsTooBig);
    }
    let mut buf = [0u8; 32];
    buf[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(H256::from_bytes(buf))
}
