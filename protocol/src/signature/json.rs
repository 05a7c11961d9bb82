//! # JSON Signature Scheme
//!
//! The signer serializes a transaction-specific JSON object with keys in
//! lexicographic order and no insignificant whitespace, then signs it with
//! `personal_sign`:
//!
//! ```text
//! digest = Keccak256("\x19Ethereum Signed Message:\n" ‖ len(json) ‖ json)
//! ```
//!
//! `len(json)` is the decimal byte length. Lists are covered in submission
//! order, so callers that want reorder-insensitive hashes sort before
//! building the object (deposit inputs do).

use serde_json::Value;

use super::SignatureError;
use crate::config::ETH_SIGNED_MESSAGE_PREFIX;
use crate::crypto::keys::{recover_address, ChainKeypair};
use crate::crypto::keccak256_multi;
use crate::identity::Address;

/// Implemented by every transaction that can be authenticated with the JSON
/// scheme.
pub trait JsonSignable {
    /// The object the signer saw. Must be deterministic for a given
    /// transaction.
    fn json_sign_map(&self) -> Value;
}

/// Canonical byte form of a sign map.
///
/// `serde_json::Map` is ordered by key, so serialization is already
/// canonical. Only objects are accepted at the top level.
pub fn canonical_json(map: &Value) -> Result<Vec<u8>, SignatureError> {
    if !map.is_object() {
        return Err(SignatureError::Encoding("sign payload is not a JSON object".into()));
    }
    serde_json::to_vec(map).map_err(|e| SignatureError::Encoding(e.to_string()))
}

/// Digest a signer produces for `map`.
pub fn sign_hash(map: &Value) -> Result<[u8; 32], SignatureError> {
    let msg = canonical_json(map)?;
    let len = msg.len().to_string();
    Ok(keccak256_multi(&[
        ETH_SIGNED_MESSAGE_PREFIX.as_bytes(),
        len.as_bytes(),
        &msg[..],
    ]))
}

/// Recover the address that produced `signature` over `tx`.
pub fn recover<T: JsonSignable + ?Sized>(tx: &T, signature: &[u8]) -> Result<Address, SignatureError> {
    let digest = sign_hash(&tx.json_sign_map())?;
    Ok(recover_address(&digest, signature)?)
}

/// Produce a JSON-scheme signature over `tx`.
pub fn sign<T: JsonSignable + ?Sized>(tx: &T, keypair: &ChainKeypair) -> Result<Vec<u8>, SignatureError> {
    let digest = sign_hash(&tx.json_sign_map())?;
    Ok(keypair.sign_digest(&digest)?.to_vec())
}
