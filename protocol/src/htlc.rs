//! # Hashed Time-Lock Transfers
//!
//! ```text
//! absent ──HashedTransfer──▶ pending ──claim (receiver, secret, now < expiry)──▶ claimed
//!                                    └─revoke (sender, now ≥ expiry)───────────▶ revoked
//! ```
//!
//! A pending record is keyed by the hash of the transaction that created
//! it. Claiming or revoking deletes the record, so each lock resolves once.

use serde::{Deserialize, Serialize};

use crate::account;
use crate::amount::BoundedAmount;
use crate::config::HASH_COMMIT_LENGTH;
use crate::crypto::sha256;
use crate::identity::Identifier;
use crate::storage::keys::join_keys;
use crate::storage::{ChainState, StateTree};

const HTLC_KEY: &[u8] = b"hashedTx";

/// Funds locked by a `HashedTransfer` transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedTransfer {
    pub from: Identifier,
    pub to: Identifier,
    pub value: BoundedAmount,
    pub hash_commit: [u8; HASH_COMMIT_LENGTH],
    /// Block time (seconds) from which the lock counts as expired.
    pub expiry: i64,
}

/// Why a claim or revoke is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HtlcRejection {
    Expired,
    InvalidSecret,
    NotYetExpired,
}

impl HashedTransfer {
    /// Positive value below `2^256` and a positive expiry.
    pub fn validate(&self) -> bool {
        !self.value.is_zero() && self.value.is_within_range() && self.expiry > 0
    }

    pub fn is_expired(&self, block_time: i64) -> bool {
        block_time >= self.expiry
    }

    /// A lock that is already expired when created is refused.
    pub fn check_create(&self, block_time: i64) -> bool {
        !self.is_expired(block_time)
    }

    /// Receiver path: before expiry, with the committed secret.
    pub fn check_claim(&self, block_time: i64, secret: &[u8]) -> Result<(), HtlcRejection> {
        if self.is_expired(block_time) {
            return Err(HtlcRejection::Expired);
        }
        if sha256(secret) != self.hash_commit {
            return Err(HtlcRejection::InvalidSecret);
        }
        Ok(())
    }

    /// Sender path: at or after expiry.
    pub fn check_revoke(&self, block_time: i64) -> Result<(), HtlcRejection> {
        if self.is_expired(block_time) {
            Ok(())
        } else {
            Err(HtlcRejection::NotYetExpired)
        }
    }
}

fn record_key(tx_hash: &[u8]) -> Vec<u8> {
    join_keys(&[HTLC_KEY, tx_hash])
}

pub fn create(state: &mut StateTree, tx_hash: &[u8], ht: &HashedTransfer) {
    match bincode::serialize(ht) {
        Ok(bytes) => state.set(record_key(tx_hash), bytes),
        Err(e) => tracing::error!(error = %e, "cannot encode hashed transfer"),
    }
}

pub fn get(state: &StateTree, tx_hash: &[u8]) -> Option<HashedTransfer> {
    let bytes = state.get(&record_key(tx_hash))?;
    match bincode::deserialize(bytes) {
        Ok(ht) => Some(ht),
        Err(e) => {
            tracing::error!(error = %e, tx_hash = %hex::encode(tx_hash), "cannot decode hashed transfer");
            None
        }
    }
}

pub fn remove(state: &mut StateTree, tx_hash: &[u8]) {
    state.remove(&record_key(tx_hash));
}

/// Pay the locked value to the receiver and drop the lock.
pub fn claim(chain: &mut ChainState, ht: &HashedTransfer, tx_hash: &[u8]) {
    account::add_balance(&mut chain.state, &ht.to, &ht.value);
    remove(&mut chain.state, tx_hash);
}

/// Return the locked value to the sender and drop the lock. The fee paid on
/// creation is not refunded.
pub fn revoke(chain: &mut ChainState, ht: &HashedTransfer, tx_hash: &[u8]) {
    account::add_balance(&mut chain.state, &ht.from, &ht.value);
    remove(&mut chain.state, tx_hash);
}
