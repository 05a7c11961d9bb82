//! Per-transaction status records, keyed by transaction hash.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::storage::keys::tx_hash_key;
use crate::storage::StateTree;

/// Terminal (or pending) outcome of a delivered transaction.
///
/// Stored as a single signed byte. `NotSet` is never written; it is what a
/// missing record reads as.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    #[default]
    NotSet,
    Fail,
    Success,
    Pending,
}

impl TxStatus {
    pub fn as_i8(self) -> i8 {
        match self {
            TxStatus::NotSet => -1,
            TxStatus::Fail => 0,
            TxStatus::Success => 1,
            TxStatus::Pending => 2,
        }
    }

    pub fn from_i8(value: i8) -> Self {
        match value {
            0 => TxStatus::Fail,
            1 => TxStatus::Success,
            2 => TxStatus::Pending,
            _ => TxStatus::NotSet,
        }
    }

    /// Decode a stored record. Anything but a single byte reads as `NotSet`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes {
            [b] => Self::from_i8(*b as i8),
            _ => TxStatus::NotSet,
        }
    }

    pub fn to_bytes(self) -> [u8; 1] {
        [self.as_i8() as u8]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TxStatus::NotSet => "not found",
            TxStatus::Fail => "fail",
            TxStatus::Success => "success",
            TxStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn status_key(tx_hash: &[u8]) -> Vec<u8> {
    tx_hash_key(tx_hash, "status")
}

pub fn get_status(state: &StateTree, tx_hash: &[u8]) -> TxStatus {
    state
        .get(&status_key(tx_hash))
        .map(TxStatus::from_bytes)
        .unwrap_or(TxStatus::NotSet)
}

pub fn set_status(state: &mut StateTree, tx_hash: &[u8], status: TxStatus) {
    state.set(status_key(tx_hash), status.to_bytes().to_vec());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_values_are_fixed() {
        assert_eq!(TxStatus::Fail.to_bytes(), [0]);
        assert_eq!(TxStatus::Success.to_bytes(), [1]);
        assert_eq!(TxStatus::Pending.to_bytes(), [2]);
        assert_eq!(TxStatus::NotSet.to_bytes(), [0xff]);
        assert_eq!(TxStatus::from_bytes(&[0xff]), TxStatus::NotSet);
        assert_eq!(TxStatus::from_bytes(&[1, 2]), TxStatus::NotSet);
        assert_eq!(TxStatus::from_bytes(&[7]), TxStatus::NotSet);
    }

    #[test]
    fn missing_record_reads_not_set() {
        let state = StateTree::new();
        assert_eq!(get_status(&state, b"nope"), TxStatus::NotSet);
        assert_eq!(get_status(&state, b"nope").to_string(), "not found");
    }

    #[test]
    fn set_then_get() {
        let mut state = StateTree::new();
        set_status(&mut state, &[1; 20], TxStatus::Pending);
        assert_eq!(get_status(&state, &[1; 20]), TxStatus::Pending);
        set_status(&mut state, &[1; 20], TxStatus::Success);
        assert_eq!(get_status(&state, &[1; 20]).as_str(), "success");
    }
}
