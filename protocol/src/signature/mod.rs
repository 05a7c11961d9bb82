//! # Signature Schemes
//!
//! A transaction is authenticated by recovering the secp256k1 address that
//! signed it. Two independent schemes decide *what* was signed:
//!
//! ```text
//! json.rs   — key-sorted JSON object under the personal_sign prefix
//! eip712.rs — EIP-712 typed structured data under a fixed domain
//! ```
//!
//! The schemes are not interchangeable. JSON payloads are built per
//! transaction with lists in a canonical order, while EIP-712 encodes fields
//! in declaration order. Each transaction picks which schemes it accepts by
//! implementing [`JsonSignable`] and/or [`Eip712Signable`].
//!
//! The scheme in use travels with the signature bytes as an explicit
//! discriminant ([`Signature`]).

pub mod eip712;
pub mod json;

use serde::{Deserialize, Serialize};

pub use eip712::{Eip712Message, Eip712Signable, Eip712Value};
pub use json::JsonSignable;

use crate::config::SIGNATURE_LENGTH;
use crate::crypto::keys::{ChainKeypair, KeyError};
use crate::identity::Address;

/// Errors raised while computing a signed digest or recovering from it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature recovery failed: {0}")]
    Key(#[from] KeyError),

    #[error("cannot encode sign payload: {0}")]
    Encoding(String),

    #[error("EIP-712 field {field:?} {reason}")]
    Eip712Field {
        field: &'static str,
        reason: &'static str,
    },

    #[error("{tx_kind} does not accept {scheme} signatures")]
    UnsupportedScheme {
        tx_kind: &'static str,
        scheme: &'static str,
    },
}

/// Which payload a signer commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignScheme {
    Json,
    Eip712,
}

/// A scheme-tagged 65-byte recoverable signature.
///
/// The length is not enforced by the type. Transaction format validation
/// rejects any other length via [`Signature::is_present`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signature {
    Json(Vec<u8>),
    Eip712(Vec<u8>),
}

impl Signature {
    pub fn scheme(&self) -> &'static str {
        match self {
            Signature::Json(_) => "json",
            Signature::Eip712(_) => "eip712",
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Signature::Json(b) | Signature::Eip712(b) => b,
        }
    }

    /// `true` iff the payload has the `(r ‖ s ‖ v)` length.
    pub fn is_present(&self) -> bool {
        self.bytes().len() == SIGNATURE_LENGTH
    }

    /// Recover the signer of a transaction that accepts both schemes.
    pub fn recover<T>(&self, tx: &T) -> Result<Address, SignatureError>
    where
        T: JsonSignable + Eip712Signable,
    {
        match self {
            Signature::Json(bytes) => json::recover(tx, bytes),
            Signature::Eip712(bytes) => eip712::recover(tx, bytes),
        }
    }

    /// Recover the signer of a transaction that only accepts JSON signatures.
    pub fn recover_json_only<T: JsonSignable>(
        &self,
        tx: &T,
        tx_kind: &'static str,
    ) -> Result<Address, SignatureError> {
        match self {
            Signature::Json(bytes) => json::recover(tx, bytes),
            Signature::Eip712(_) => Err(SignatureError::UnsupportedScheme {
                tx_kind,
                scheme: self.scheme(),
            }),
        }
    }

    /// Sign with the JSON scheme.
    pub fn sign_json<T: JsonSignable + ?Sized>(
        tx: &T,
        keypair: &ChainKeypair,
    ) -> Result<Self, SignatureError> {
        json::sign(tx, keypair).map(Signature::Json)
    }

    /// Sign with the EIP-712 scheme.
    pub fn sign_eip712<T: Eip712Signable + ?Sized>(
        tx: &T,
        keypair: &ChainKeypair,
    ) -> Result<Self, SignatureError> {
        eip712::sign(tx, keypair).map(Signature::Eip712)
    }

    /// Sign a transaction that accepts both schemes.
    pub fn sign<T: JsonSignable + Eip712Signable>(
        tx: &T,
        keypair: &ChainKeypair,
        scheme: SignScheme,
    ) -> Result<Self, SignatureError> {
        match scheme {
            SignScheme::Json => Self::sign_json(tx, keypair),
            SignScheme::Eip712 => Self::sign_eip712(tx, keypair),
        }
    }

    /// Sign a transaction that only accepts JSON signatures.
    pub fn sign_json_only<T: JsonSignable>(
        tx: &T,
        keypair: &ChainKeypair,
        scheme: SignScheme,
        tx_kind: &'static str,
    ) -> Result<Self, SignatureError> {
        match scheme {
            SignScheme::Json => Self::sign_json(tx, keypair),
            SignScheme::Eip712 => Err(SignatureError::UnsupportedScheme {
                tx_kind,
                scheme: "eip712",
            }),
        }
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}Signature(0x{})", self.scheme(), hex::encode(self.bytes()))
    }
}
