//! # Identity Module
//!
//! Every party named in a transaction is an [`Identifier`]: either an
//! externally-derived [`Address`] or a chain-native [`ChainId`]. The two
//! addressing schemes coexist because users can receive funds at a plain
//! address before they ever register, and keep using the address to sign
//! after they do.
//!
//! ```text
//! address.rs    — Address (0x hex) and ChainId (base64) key types
//! identifier.rs — the Identifier sum type
//! ```
//!
//! Resolving an identifier to the account it denotes requires ledger state
//! and lives in [`crate::account`].

pub mod address;
pub mod identifier;

pub use address::{Address, ChainId};
pub use identifier::Identifier;

/// Errors raised while parsing identity strings or bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid {kind} length: expected {expected} bytes, got {got}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    #[error("not a chain id or address: {0:?}")]
    Unrecognized(String),
}
