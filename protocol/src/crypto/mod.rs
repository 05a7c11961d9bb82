//! # Cryptographic Primitives
//!
//! Thin wrappers over audited implementations:
//!
//! - **secp256k1** ECDSA public-key recovery (`k256`), so that every
//!   transaction authenticates as an Ethereum-compatible address.
//! - **Keccak-256** (`sha3`) for everything a wallet signs.
//! - **SHA-256** (`sha2`) for transaction hashes and hash commitments.
//! - **BLAKE3** (`blake3`) for the state commitment.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, blake3_hash_multi, keccak256, keccak256_multi, sha256, truncated_sha256};
pub use keys::{address_of, recover_address, ChainKeypair, KeyError};
