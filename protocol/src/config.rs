//! # Protocol Configuration & Constants
//!
//! Every magic number the state machine depends on lives here. These values
//! are consensus-critical: two nodes that disagree on any of them will
//! compute different responses for the same transaction and fork.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Version string reported by the application layer.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Human-readable application name, used in `info` responses.
pub const APP_NAME: &str = "LikeChain";

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

/// Length of an externally-derived (Ethereum style) account address.
pub const ADDRESS_LENGTH: usize = 20;

/// Length of a chain-native account id.
pub const CHAIN_ID_LENGTH: usize = 20;

/// Length of a transaction hash as computed by the application layer
/// (SHA-256 truncated to 20 bytes).
pub const TX_HASH_LENGTH: usize = 20;

/// Length of an HTLC hash commitment and of the secret that opens it.
pub const HASH_COMMIT_LENGTH: usize = 32;

/// Length of a recoverable secp256k1 signature `(r ‖ s ‖ v)`.
pub const SIGNATURE_LENGTH: usize = 65;

/// Upper bound on the byte length of a transfer remark.
pub const MAX_REMARK_SIZE: usize = 4096;

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Prefix applied to JSON sign payloads before hashing, as in `personal_sign`.
pub const ETH_SIGNED_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// EIP-712 domain name. Part of the domain separator; changing it
/// invalidates every structured signature ever produced.
pub const EIP712_DOMAIN_NAME: &str = "LikeChain Signature";

/// EIP-712 domain version.
pub const EIP712_DOMAIN_VERSION: &str = "1";

/// Offset subtracted from the `v` byte of a signature (yellow paper 27/28).
pub const SIGNATURE_V_OFFSET: u8 = 27;

// ---------------------------------------------------------------------------
// Weighted Approval
// ---------------------------------------------------------------------------

/// A proposal executes once `weight * DENOMINATOR > total * NUMERATOR`,
/// i.e. strictly more than two thirds of the eligible weight backs it.
pub const APPROVAL_THRESHOLD_NUMERATOR: u64 = 2;

/// See [`APPROVAL_THRESHOLD_NUMERATOR`].
pub const APPROVAL_THRESHOLD_DENOMINATOR: u64 = 3;

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// First value of the seed mixed into freshly generated chain ids.
pub const CHAIN_ID_SEED_START: u64 = 1;

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Response code for raw bytes that do not decode into a transaction.
pub const CODE_UNDECODABLE_TX: u32 = 1;

/// Largest encoded transaction the codec will attempt to decode.
pub const MAX_TX_BYTES: u64 = 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_two_thirds() {
        // 67 of 100 crosses, 66 of 99 does not.
        assert!(67 * APPROVAL_THRESHOLD_DENOMINATOR > 100 * APPROVAL_THRESHOLD_NUMERATOR);
        assert!(!(66 * APPROVAL_THRESHOLD_DENOMINATOR > 99 * APPROVAL_THRESHOLD_NUMERATOR));
    }

    #[test]
    fn signed_message_prefix_starts_with_0x19() {
        assert_eq!(ETH_SIGNED_MESSAGE_PREFIX.as_bytes()[0], 0x19);
    }
}
