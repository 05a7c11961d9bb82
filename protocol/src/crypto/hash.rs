//! # Hashing Utilities
//!
//! Three hash functions, each with a fixed job:
//!
//! - **Keccak-256** — everything that must match Ethereum tooling: signed
//!   message digests, EIP-712 hashing, address derivation, chain id minting.
//! - **SHA-256** — transaction hashes (truncated to 20 bytes), HTLC hash
//!   commitments, deposit proposal hashes and withdrawal proof keys.
//! - **BLAKE3** — the state tree's Merkle commitment. Internal only, never
//!   seen by a signer.

use sha2::{Digest, Sha256};
use sha3::Keccak256;

use crate::config::TX_HASH_LENGTH;

/// Keccak-256 digest (the pre-standard SHA-3 variant Ethereum uses).
///
/// # Example
///
/// ```
/// use likechain_protocol::crypto::keccak256;
///
/// let hash = keccak256(b"");
/// assert_eq!(hash[0], 0xc5);
/// ```
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-256 over several slices without concatenating them first.
pub fn keccak256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 truncated to [`TX_HASH_LENGTH`] bytes. Used for raw transaction
/// hashes and deposit proposal hashes.
pub fn truncated_sha256(data: &[u8]) -> [u8; TX_HASH_LENGTH] {
    let full = sha256(data);
    let mut out = [0u8; TX_HASH_LENGTH];
    out.copy_from_slice(&full[..TX_HASH_LENGTH]);
    out
}

/// BLAKE3 digest.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// BLAKE3 over several slices without concatenating them first.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Compute a binary Merkle root over leaf hashes with BLAKE3.
///
/// An odd node at any level is paired with itself. A single leaf is also
/// paired with itself so the root is always the output of a hash. An empty
/// input yields all zeros.
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut level: Vec<[u8; 32]> = leaves.to_vec();
    if level.len() == 1 {
        return blake3_hash_multi(&[&level[0][..], &level[0][..]]);
    }

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).unwrap_or(&pair[0]);
                blake3_hash_multi(&[&pair[0][..], &right[..]])
            })
            .collect();
    }

    level[0]
}

/// Sibling path from `index` to the root of the tree built by
/// [`merkle_root`]. Each step is `(sibling, sibling_is_left)`.
pub fn merkle_path(leaves: &[[u8; 32]], mut index: usize) -> Option<Vec<([u8; 32], bool)>> {
    if index >= leaves.len() {
        return None;
    }

    let mut level: Vec<[u8; 32]> = leaves.to_vec();
    let mut path = Vec::new();

    if level.len() == 1 {
        path.push((level[0], false));
        return Some(path);
    }

    while level.len() > 1 {
        let sibling_index = index ^ 1;
        let sibling = level.get(sibling_index).copied().unwrap_or(level[index]);
        path.push((sibling, sibling_index < index));

        level = level
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).unwrap_or(&pair[0]);
                blake3_hash_multi(&[&pair[0][..], &right[..]])
            })
            .collect();
        index /= 2;
    }

    Some(path)
}

/// Fold a leaf up a path produced by [`merkle_path`].
pub fn merkle_fold(leaf: [u8; 32], path: &[([u8; 32], bool)]) -> [u8; 32] {
    path.iter().fold(leaf, |acc, (sibling, sibling_is_left)| {
        if *sibling_is_left {
            blake3_hash_multi(&[&sibling[..], &acc[..]])
        } else {
            blake3_hash_multi(&[&acc[..], &sibling[..]])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_empty_vector() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn sha256_empty_vector() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn truncated_sha256_is_prefix() {
        let full = sha256(b"likechain");
        assert_eq!(truncated_sha256(b"likechain"), full[..20]);
    }

    #[test]
    fn keccak_multi_matches_concat() {
        assert_eq!(keccak256_multi(&[&b"ab"[..], &b"cd"[..]]), keccak256(b"abcd"));
    }

    #[test]
    fn merkle_root_empty_and_single() {
        assert_eq!(merkle_root(&[]), [0u8; 32]);
        let leaf = blake3_hash(b"leaf");
        assert_eq!(merkle_root(&[leaf]), blake3_hash_multi(&[&leaf[..], &leaf[..]]));
    }

    #[test]
    fn merkle_root_order_matters() {
        let a = blake3_hash(b"a");
        let b = blake3_hash(b"b");
        assert_ne!(merkle_root(&[a, b]), merkle_root(&[b, a]));
    }

    #[test]
    fn every_path_folds_to_root() {
        for n in 1..=9usize {
            let leaves: Vec<[u8; 32]> = (0..n).map(|i| blake3_hash(&[i as u8])).collect();
            let root = merkle_root(&leaves);
            for (i, leaf) in leaves.iter().enumerate() {
                let path = merkle_path(&leaves, i).unwrap();
                assert_eq!(merkle_fold(*leaf, &path), root, "n={} i={}", n, i);
            }
            assert!(merkle_path(&leaves, n).is_none());
        }
    }
}
