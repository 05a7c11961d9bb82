//! The [`Identifier`] sum type that names every party in a transaction.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Address, ChainId, IdentityError};

/// Either kind of account key.
///
/// Equality is structural and variant-sensitive: an `Address` never equals a
/// `ChainId`, even when both refer to the same account. Comparing parties
/// therefore always goes through the account ledger's resolver first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Identifier {
    Address(Address),
    ChainId(ChainId),
}

impl Identifier {
    /// Parse a client-supplied identity string. Base64 chain ids are tried
    /// first, then hex addresses.
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        if let Ok(id) = ChainId::from_base64(s) {
            return Ok(Identifier::ChainId(id));
        }
        Address::from_hex(s)
            .map(Identifier::Address)
            .map_err(|_| IdentityError::Unrecognized(s.to_string()))
    }

    /// Raw 20 bytes, whichever variant this is.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Identifier::Address(addr) => addr.as_bytes(),
            Identifier::ChainId(id) => id.as_bytes(),
        }
    }

    /// The string hashed into EIP-712 `string`-typed identity fields.
    /// Same rendering as [`Display`](fmt::Display).
    pub fn eip712_string(&self) -> String {
        self.to_string()
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            Identifier::Address(addr) => Some(addr),
            Identifier::ChainId(_) => None,
        }
    }

    pub fn as_chain_id(&self) -> Option<&ChainId> {
        match self {
            Identifier::ChainId(id) => Some(id),
            Identifier::Address(_) => None,
        }
    }
}

impl From<Address> for Identifier {
    fn from(addr: Address) -> Self {
        Identifier::Address(addr)
    }
}

impl From<ChainId> for Identifier {
    fn from(id: ChainId) -> Self {
        Identifier::ChainId(id)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Address(addr) => write!(f, "{}", addr),
            Identifier::ChainId(id) => write!(f, "{}", id),
        }
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Address(addr) => write!(f, "{:?}", addr),
            Identifier::ChainId(id) => write!(f, "{:?}", id),
        }
    }
}
