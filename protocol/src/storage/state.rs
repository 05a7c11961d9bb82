//! # State Tree
//!
//! An ordered byte-key/byte-value map with a Merkle commitment. Both chain
//! namespaces (the main state and the withdraw tree) are instances of it.
//!
//! ## Commitment
//!
//! ```text
//! leaf = BLAKE3(len(key) as u32 BE ‖ key ‖ value)
//! root = merkle_root([leaf for (key, value) in sorted(entries)])
//! ```
//!
//! The entries live in a `BTreeMap`, so iteration order (and therefore the
//! root) is independent of insertion order.
//!
//! ## Pending Changes
//!
//! Every write since the last [`StateTree::take_pending`] is remembered so
//! the persistence layer can flush only what changed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::crypto::hash::{blake3_hash_multi, merkle_fold, merkle_path, merkle_root};

/// A write recorded since the last flush. `None` marks a deletion.
pub type PendingChanges = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

// ---------------------------------------------------------------------------
// MerkleProof
// ---------------------------------------------------------------------------

/// Inclusion proof for one `(key, value)` entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    /// Position of the leaf in sorted order.
    pub index: usize,
    /// Sibling hashes from leaf to root, each tagged with whether the
    /// sibling sits on the left.
    pub path: Vec<([u8; 32], bool)>,
}

impl MerkleProof {
    /// `true` iff this proof folds up to `root`.
    pub fn verify(&self, root: &[u8; 32]) -> bool {
        merkle_fold(leaf_hash(&self.key, &self.value), &self.path) == *root
    }
}

fn leaf_hash(key: &[u8], value: &[u8]) -> [u8; 32] {
    let key_len = (key.len() as u32).to_be_bytes();
    blake3_hash_multi(&[&key_len[..], key, value])
}

// ---------------------------------------------------------------------------
// StateTree
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct StateTree {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    pending: PendingChanges,
}

impl StateTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted entries. Nothing is marked pending.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
    {
        Self {
            entries: entries.into_iter().collect(),
            pending: BTreeMap::new(),
        }
    }

    /// Copy of the current entries with no pending writes.
    pub fn snapshot(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            pending: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.pending.insert(key.clone(), Some(value.clone()));
        self.entries.insert(key, value);
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.pending.insert(key.to_vec(), None);
        }
        removed
    }

    /// Entries whose key starts with `prefix`, in key order.
    pub fn scan_prefix<'a>(&'a self, prefix: &'a [u8]) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        self.entries
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    pub fn has_prefix(&self, prefix: &[u8]) -> bool {
        self.scan_prefix(prefix).next().is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn leaves(&self) -> Vec<[u8; 32]> {
        self.entries.iter().map(|(k, v)| leaf_hash(k, v)).collect()
    }

    /// Merkle root over all entries. Empty tree yields all zeros.
    pub fn root_hash(&self) -> [u8; 32] {
        merkle_root(&self.leaves())
    }

    /// Inclusion proof for `key`, or `None` when absent.
    pub fn prove(&self, key: &[u8]) -> Option<MerkleProof> {
        let index = self.entries.keys().position(|k| k.as_slice() == key)?;
        let value = self.entries.get(key)?.clone();
        let path = merkle_path(&self.leaves(), index)?;
        Some(MerkleProof {
            key: key.to_vec(),
            value,
            index,
            path,
        })
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain the writes recorded since the previous call.
    pub fn take_pending(&mut self) -> PendingChanges {
        std::mem::take(&mut self.pending)
    }
}
