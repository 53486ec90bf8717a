//! # exo-crypto
//!
//! Keccak-256 hashing plus the secp256k1 operations needed to sign
//! precompile transactions and derive the sender address.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod signature;

pub use error::CryptoError;
pub use hash::keccak256;
pub use signature::{
    parse_private_key, public_key_to_address, recover_public_key, sign, PrivateKey, PublicKey,
    Signature,
};
