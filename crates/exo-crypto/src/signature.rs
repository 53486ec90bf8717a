//! ECDSA signature operations using secp256k1

use exo_primitives::{Address, H256};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};

use crate::{keccak256, CryptoError};

/// n/2 for the secp256k1 group order
const SECP256K1_N_DIV_2: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Recoverable ECDSA signature
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// r component
    pub r: [u8; 32],
    /// s component, always in the lower half of the curve order
    pub s: [u8; 32],
    /// recovery id (0 or 1)
    pub recovery_id: u8,
}

/// secp256k1 public key
pub type PublicKey = VerifyingKey;

/// secp256k1 private key
pub type PrivateKey = SigningKey;

impl Signature {
    /// Whether `s <= n/2` (EIP-2)
    pub fn is_low_s(&self) -> bool {
        // arrays compare lexicographically, i.e. as big-endian integers
        self.s <= SECP256K1_N_DIV_2
    }

    /// 65-byte `r || s || recovery_id`
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.recovery_id;
        bytes
    }
}

/// Parse a 32-byte scalar into a signing key.
pub fn parse_private_key(bytes: &[u8]) -> Result<PrivateKey, CryptoError> {
    SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)
}

/// Sign a 32-byte digest, returning a low-s recoverable signature
pub fn sign(message_hash: &H256, private_key: &PrivateKey) -> Result<Signature, CryptoError> {
    let (signature, recovery_id) = private_key
        .sign_prehash_recoverable(message_hash.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    // negating s mirrors R, which flips the y parity
    let (signature, recovery_id) = match signature.normalize_s() {
        Some(low) => (
            low,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (signature, recovery_id),
    };

    Ok(Signature {
        r: signature.r().to_bytes().into(),
        s: signature.s().to_bytes().into(),
        recovery_id: recovery_id.to_byte(),
    })
}

/// Recover the signer's public key from a signature over `message_hash`
pub fn recover_public_key(
    message_hash: &H256,
    signature: &Signature,
) -> Result<PublicKey, CryptoError> {
    let r: k256::FieldBytes = signature.r.into();
    let s: k256::FieldBytes = signature.s.into();
    let k256_sig = K256Signature::from_scalars(r, s)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    let recovery_id = RecoveryId::from_byte(signature.recovery_id)
        .ok_or(CryptoError::InvalidRecoveryId(signature.recovery_id))?;

    VerifyingKey::recover_from_prehash(message_hash.as_bytes(), &k256_sig, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))
}

/// Account address: last 20 bytes of keccak(uncompressed pubkey without 0x04)
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);

    let mut addr_bytes = [0u8; 20];
    addr_bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::from_bytes(addr_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    // Well-known dev key (hardhat account #0)
    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_known_key_address() {
        let key = parse_private_key(&hex::decode(DEV_KEY).unwrap()).unwrap();
        let address = public_key_to_address(key.verifying_key());
        assert_eq!(
            address.to_hex(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_sign_and_recover() {
        let private_key = SigningKey::random(&mut OsRng);
        let message_hash = keccak256(b"test message");

        let signature = sign(&message_hash, &private_key).unwrap();
        let recovered = recover_public_key(&message_hash, &signature).unwrap();

        assert_eq!(private_key.verifying_key(), &recovered);
        assert!(signature.recovery_id <= 1);
    }

    #[test]
    fn test_signatures_are_low_s() {
        for i in 0..16u8 {
            let private_key = SigningKey::random(&mut OsRng);
            let signature = sign(&keccak256(&[i]), &private_key).unwrap();
            assert!(signature.is_low_s());
        }
    }

    #[test]
    fn test_parse_private_key_rejects_zero() {
        assert!(matches!(
            parse_private_key(&[0u8; 32]),
            Err(CryptoError::InvalidPrivateKey)
        ));
        assert!(parse_private_key(&[1u8; 31]).is_err());
    }

    #[test]
    fn test_recover_rejects_bad_recovery_id() {
        let private_key = SigningKey::random(&mut OsRng);
        let hash = keccak256(b"x");
        let mut signature = sign(&hash, &private_key).unwrap();
        signature.recovery_id = 9;
        assert!(matches!(
            recover_public_key(&hash, &signature),
            Err(CryptoError::InvalidRecoveryId(9))
        ));
    }
}
