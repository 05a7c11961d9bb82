//! # secp256k1 Keys
//!
//! Signature recovery and the signing side used by clients and fixtures.
//!
//! Signatures are 65 bytes: `r (32) ‖ s (32) ‖ v (1)`. `v` follows the
//! yellow paper convention (27 or 28); the raw recovery ids 0 and 1 are also
//! accepted. The signer's address is `Keccak256(uncompressed_pubkey[1..])[12..]`.
//!
//! Key bytes are never logged.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

use crate::config::{SIGNATURE_LENGTH, SIGNATURE_V_OFFSET};
use crate::crypto::hash::keccak256;
use crate::identity::Address;

/// Errors from signature recovery and key handling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("invalid signature length: expected {expected} bytes, got {got}")]
    InvalidSignatureLength { expected: usize, got: usize },

    #[error("invalid recovery id byte: {0}")]
    InvalidRecoveryId(u8),

    #[error("malformed signature scalars")]
    MalformedSignature,

    #[error("public key recovery failed")]
    RecoveryFailed,

    #[error("invalid secret key bytes")]
    InvalidSecretKey,
}

/// Derive the account address of a public key.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest[12..]);
    Address(addr)
}

/// Recover the signing address from a 32-byte message digest and a 65-byte
/// signature.
pub fn recover_address(digest: &[u8; 32], signature: &[u8]) -> Result<Address, KeyError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(KeyError::InvalidSignatureLength {
            expected: SIGNATURE_LENGTH,
            got: signature.len(),
        });
    }

    let v = signature[64];
    let recovery_byte = if v >= SIGNATURE_V_OFFSET { v - SIGNATURE_V_OFFSET } else { v };
    let recovery_id =
        RecoveryId::from_byte(recovery_byte).ok_or(KeyError::InvalidRecoveryId(v))?;
    let sig = Signature::from_slice(&signature[..64]).map_err(|_| KeyError::MalformedSignature)?;

    let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| KeyError::RecoveryFailed)?;
    Ok(address_of(&key))
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// A secp256k1 signing key together with its derived address.
pub struct ChainKeypair {
    signing_key: SigningKey,
    address: Address,
}

impl ChainKeypair {
    /// Load from 32 raw secret-key bytes.
    pub fn from_bytes(secret: &[u8]) -> Result<Self, KeyError> {
        let signing_key = SigningKey::from_slice(secret).map_err(|_| KeyError::InvalidSecretKey)?;
        let address = address_of(signing_key.verifying_key());
        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Load from hex, with or without a `0x` prefix.
    pub fn from_hex(secret_hex: &str) -> Result<Self, KeyError> {
        let stripped = secret_hex.strip_prefix("0x").unwrap_or(secret_hex);
        let bytes = hex::decode(stripped).map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_bytes(&bytes)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte digest, returning `r ‖ s ‖ v` with `v` in {27, 28}.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; SIGNATURE_LENGTH], KeyError> {
        let (sig, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|_| KeyError::MalformedSignature)?;
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..64].copy_from_slice(&sig.to_bytes());
        out[64] = recovery_id.to_byte() + SIGNATURE_V_OFFSET;
        Ok(out)
    }
}

impl std::fmt::Debug for ChainKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainKeypair")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
