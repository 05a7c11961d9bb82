//! Byte-key construction helpers shared by every state namespace.
//!
//! ```text
//! raw_key(b"abc", "acc", "balance") = b"acc_abc_balance"
//! join_keys(&[b"a", b"b", b"c"])    = b"a_b_c"
//! ```
//!
//! Integers embedded in keys or stored as values are 8-byte big-endian so
//! lexicographic order matches numeric order.

/// `prefix_content_suffix`, omitting the separator next to an empty part.
pub fn raw_key(content: &[u8], prefix: &str, suffix: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + content.len() + suffix.len() + 2);
    if !prefix.is_empty() {
        key.extend_from_slice(prefix.as_bytes());
        key.push(b'_');
    }
    key.extend_from_slice(content);
    if !suffix.is_empty() {
        key.push(b'_');
        key.extend_from_slice(suffix.as_bytes());
    }
    key
}

/// Key scoped to a transaction hash: `tx:hash:_<hash>_<suffix>`.
pub fn tx_hash_key(tx_hash: &[u8], suffix: &str) -> Vec<u8> {
    raw_key(tx_hash, "tx:hash:", suffix)
}

/// Join components with `_`.
pub fn join_keys(parts: &[&[u8]]) -> Vec<u8> {
    let mut key = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(b'_');
        }
        key.extend_from_slice(part);
    }
    key
}

pub fn encode_u64(n: u64) -> [u8; 8] {
    n.to_be_bytes()
}

/// Decode an 8-byte big-endian integer. Any other length yields `None`.
pub fn decode_u64(bytes: &[u8]) -> Option<u64> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_key_layout() {
        assert_eq!(raw_key(b"abc", "acc", "balance"), b"acc_abc_balance".to_vec());
        assert_eq!(raw_key(b"abc", "", "balance"), b"abc_balance".to_vec());
        assert_eq!(raw_key(b"abc", "acc", ""), b"acc_abc".to_vec());
    }

    #[test]
    fn tx_hash_key_layout() {
        assert_eq!(tx_hash_key(b"h", "status"), b"tx:hash:_h_status".to_vec());
    }

    #[test]
    fn join_keys_layout() {
        assert_eq!(join_keys(&[b"a", b"bc", b"d"]), b"a_bc_d".to_vec());
        assert!(join_keys(&[]).is_empty());
    }

    #[test]
    fn u64_is_big_endian() {
        assert_eq!(encode_u64(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(decode_u64(&encode_u64(1337)), Some(1337));
        assert_eq!(decode_u64(&[1, 2, 3]), None);
    }
}
