//! # Account Keys
//!
//! The two 20-byte account key types that an [`Identifier`](super::Identifier)
//! can carry:
//!
//! - [`Address`] is derived off-chain from a secp256k1 public key
//!   (`Keccak256(pubkey)[12..]`), exactly like an Ethereum address. Rendered
//!   as lowercase `0x`-prefixed hex.
//! - [`ChainId`] is minted by the chain when an address registers. It has no
//!   relationship to any key and is rendered as standard base64.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::IdentityError;
use crate::config::{ADDRESS_LENGTH, CHAIN_ID_LENGTH};

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An externally-derived account address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    /// Build from a byte slice that must be exactly 20 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentityError> {
        let arr: [u8; ADDRESS_LENGTH] =
            bytes.try_into().map_err(|_| IdentityError::InvalidLength {
                kind: "address",
                expected: ADDRESS_LENGTH,
                got: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Parse `0x`-prefixed (or bare) hex. Mixed case is accepted.
    pub fn from_hex(s: &str) -> Result<Self, IdentityError> {
        let stripped = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| IdentityError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl std::str::FromStr for Address {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// ---------------------------------------------------------------------------
// ChainId
// ---------------------------------------------------------------------------

/// A chain-native account id, generated at registration time.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(pub [u8; CHAIN_ID_LENGTH]);

impl ChainId {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentityError> {
        let arr: [u8; CHAIN_ID_LENGTH] =
            bytes.try_into().map_err(|_| IdentityError::InvalidLength {
                kind: "chain id",
                expected: CHAIN_ID_LENGTH,
                got: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Parse the standard base64 rendering.
    pub fn from_base64(s: &str) -> Result<Self, IdentityError> {
        let bytes = BASE64
            .decode(s)
            .map_err(|e| IdentityError::InvalidBase64(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&BASE64.encode(self.0))
    }
}

impl fmt::Debug for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainId({})", self)
    }
}

impl std::str::FromStr for ChainId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64(s)
    }
}
