//! # EIP-712 Structured Signature Scheme
//!
//! ```text
//! domain_hash = Keccak256(Keccak256("EIP712Domain(string name,string version)")
//!                         ‖ Keccak256(name) ‖ Keccak256(version))
//! type_hash   = Keccak256("Name(type1 field1,type2 field2,...)")
//! struct_hash = Keccak256(type_hash ‖ enc(field1) ‖ enc(field2) ‖ ...)
//! digest      = Keccak256(0x19 0x01 ‖ domain_hash ‖ struct_hash)
//! ```
//!
//! Every field encodes to one 32-byte word:
//!
//! | type      | encoding                                   |
//! |-----------|--------------------------------------------|
//! | `string`  | `Keccak256(utf8 bytes)`                    |
//! | `uint256` | big-endian, left-padded                    |
//! | `uint64`  | big-endian, left-padded                    |
//! | `address` | 20 bytes, left-padded with zeros           |
//! | `bytes32` | up to 32 bytes, right-padded with zeros    |
//!
//! Field order is part of the signed message.

use std::sync::OnceLock;

use super::SignatureError;
use crate::amount::BoundedAmount;
use crate::config::{EIP712_DOMAIN_NAME, EIP712_DOMAIN_VERSION};
use crate::crypto::keys::{recover_address, ChainKeypair};
use crate::crypto::{keccak256, keccak256_multi};
use crate::identity::Address;

const DOMAIN_TYPE: &str = "EIP712Domain(string name,string version)";

static DOMAIN_PREFIX: OnceLock<[u8; 34]> = OnceLock::new();

/// `0x19 0x01 ‖ domain_hash`, computed on first use.
pub fn domain_prefix() -> &'static [u8; 34] {
    DOMAIN_PREFIX.get_or_init(|| {
        let domain_hash = keccak256_multi(&[
            &keccak256(DOMAIN_TYPE.as_bytes())[..],
            &keccak256(EIP712_DOMAIN_NAME.as_bytes())[..],
            &keccak256(EIP712_DOMAIN_VERSION.as_bytes())[..],
        ]);
        let mut prefix = [0u8; 34];
        prefix[0] = 0x19;
        prefix[1] = 0x01;
        prefix[2..].copy_from_slice(&domain_hash);
        prefix
    })
}

// ---------------------------------------------------------------------------
// Field Values
// ---------------------------------------------------------------------------

/// A typed field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Eip712Value {
    String(String),
    Uint256(BoundedAmount),
    Uint64(u64),
    Address(Address),
    Bytes32(Vec<u8>),
}

impl Eip712Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Eip712Value::String(_) => "string",
            Eip712Value::Uint256(_) => "uint256",
            Eip712Value::Uint64(_) => "uint64",
            Eip712Value::Address(_) => "address",
            Eip712Value::Bytes32(_) => "bytes32",
        }
    }

    fn encode(&self, field: &'static str) -> Result<[u8; 32], SignatureError> {
        let mut word = [0u8; 32];
        match self {
            Eip712Value::String(s) => word = keccak256(s.as_bytes()),
            Eip712Value::Uint256(n) => {
                word = n.to_uint256_bytes().ok_or(SignatureError::Eip712Field {
                    field,
                    reason: "exceeds 256 bits",
                })?;
            }
            Eip712Value::Uint64(n) => word[24..].copy_from_slice(&n.to_be_bytes()),
            Eip712Value::Address(addr) => word[12..].copy_from_slice(addr.as_bytes()),
            Eip712Value::Bytes32(bytes) => {
                if bytes.len() > 32 {
                    return Err(SignatureError::Eip712Field {
                        field,
                        reason: "longer than 32 bytes",
                    });
                }
                word[..bytes.len()].copy_from_slice(bytes);
            }
        }
        Ok(word)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A named struct with ordered fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Eip712Message {
    pub name: &'static str,
    pub fields: Vec<(&'static str, Eip712Value)>,
}

impl Eip712Message {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Append a field. Order of calls is the order in the type string.
    pub fn field(mut self, name: &'static str, value: Eip712Value) -> Self {
        self.fields.push((name, value));
        self
    }

    /// `Name(type1 name1,type2 name2)`
    pub fn type_string(&self) -> String {
        let members: Vec<String> = self
            .fields
            .iter()
            .map(|(name, value)| format!("{} {}", value.type_name(), name))
            .collect();
        format!("{}({})", self.name, members.join(","))
    }

    pub fn struct_hash(&self) -> Result<[u8; 32], SignatureError> {
        let mut buf = Vec::with_capacity(32 * (self.fields.len() + 1));
        buf.extend_from_slice(&keccak256(self.type_string().as_bytes()));
        for (name, value) in &self.fields {
            buf.extend_from_slice(&value.encode(*name)?);
        }
        Ok(keccak256(&buf))
    }

    /// Final digest to sign.
    pub fn sign_hash(&self) -> Result<[u8; 32], SignatureError> {
        let struct_hash = self.struct_hash()?;
        Ok(keccak256_multi(&[&domain_prefix()[..], &struct_hash[..]]))
    }
}

/// Implemented by transactions that accept structured signatures.
pub trait Eip712Signable {
    fn eip712_message(&self) -> Eip712Message;
}

pub fn recover<T: Eip712Signable + ?Sized>(tx: &T, signature: &[u8]) -> Result<Address, SignatureError> {
    let digest = tx.eip712_message().sign_hash()?;
    Ok(recover_address(&digest, signature)?)
}

pub fn sign<T: Eip712Signable + ?Sized>(tx: &T, keypair: &ChainKeypair) -> Result<Vec<u8>, SignatureError> {
    let digest = tx.eip712_message().sign_hash()?;
    Ok(keypair.sign_digest(&digest)?.to_vec())
}
