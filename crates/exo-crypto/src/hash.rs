//! Keccak-256 hashing

use exo_primitives::H256;
use sha3::{Digest, Keccak256};

/// Compute the Keccak-256 digest of `data`
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    H256::from_bytes(hasher.finalize().into())
}
