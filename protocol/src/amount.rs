//! # Bounded Amounts
//!
//! Every monetary value on the chain (transfer values, fees, balances,
//! deposit inputs) is a [`BoundedAmount`]: a non-negative integer that is
//! valid iff `0 <= value < 2^256`.
//!
//! ## Representation
//!
//! Values are held in a 512-bit integer so that intermediate sums (a transfer
//! with many outputs plus its fee) never wrap. The 256-bit range invariant is
//! checked explicitly with [`BoundedAmount::is_within_range`] during format
//! validation rather than being baked into the storage type.
//!
//! ## Canonical Bytes
//!
//! On the wire and in the ledger an amount is its minimal big-endian byte
//! string. Zero is a single `0x00` byte. Decoding insists on that exact form:
//! leading zero bytes and empty input are rejected, so there is exactly one
//! encoding per value.

use primitive_types::{U256, U512};
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};

/// Widest value a canonical byte string may carry (64 bytes).
const MAX_ENCODED_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Reasons an untrusted string or byte sequence is not a bounded amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("not a valid bounded amount: {input:?}")]
    InvalidDecimal { input: String },

    #[error("amount {input} is outside [0, 2^256)")]
    OutOfRange { input: String },

    #[error("amount bytes are not in canonical form (length {len})")]
    NonCanonicalBytes { len: usize },
}

// ---------------------------------------------------------------------------
// BoundedAmount
// ---------------------------------------------------------------------------

/// A non-negative integer amount, valid iff it fits in 256 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoundedAmount(U512);

impl BoundedAmount {
    /// The zero amount.
    pub fn zero() -> Self {
        Self(U512::zero())
    }

    /// Parse a base-10 string.
    ///
    /// Only ASCII digits are accepted; signs, whitespace, and fractional parts
    /// are rejected. The parsed value must survive a trip through its
    /// canonical byte form and must be below `2^256`.
    pub fn from_decimal_string(input: &str) -> Result<Self, AmountError> {
        let invalid = || AmountError::InvalidDecimal {
            input: input.to_string(),
        };

        if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let value = U512::from_dec_str(input).map_err(|_| invalid())?;
        let amount = Self(value);

        match Self::from_canonical_bytes(&amount.to_canonical_bytes()) {
            Ok(reparsed) if reparsed == amount => {}
            _ => return Err(invalid()),
        }

        if !amount.is_within_range() {
            return Err(AmountError::OutOfRange {
                input: input.to_string(),
            });
        }

        Ok(amount)
    }

    /// Minimal big-endian encoding. Zero encodes as `[0x00]`.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        if self.0.is_zero() {
            return vec![0];
        }
        let mut buf = [0u8; MAX_ENCODED_LEN];
        self.0.to_big_endian(&mut buf);
        let first = buf.iter().position(|b| *b != 0).unwrap_or(MAX_ENCODED_LEN - 1);
        buf[first..].to_vec()
    }

    /// Inverse of [`to_canonical_bytes`](Self::to_canonical_bytes).
    ///
    /// Accepts values up to 512 bits so that out-of-range amounts survive
    /// decoding and are reported by format validation instead of the codec.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, AmountError> {
        let non_canonical = || AmountError::NonCanonicalBytes { len: bytes.len() };

        match bytes {
            [] => Err(non_canonical()),
            [0] => Ok(Self::zero()),
            [0, ..] => Err(non_canonical()),
            _ if bytes.len() > MAX_ENCODED_LEN => Err(non_canonical()),
            _ => Ok(Self(U512::from_big_endian(bytes))),
        }
    }

    /// `true` iff the value is below `2^256`.
    pub fn is_within_range(&self) -> bool {
        self.0.bits() <= 256
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The value as a 32-byte big-endian word, as used by EIP-712 `uint256`
    /// fields and the packed withdrawal proof. `None` when out of range.
    pub fn to_uint256_bytes(&self) -> Option<[u8; 32]> {
        if !self.is_within_range() {
            return None;
        }
        let mut wide = [0u8; MAX_ENCODED_LEN];
        self.0.to_big_endian(&mut wide);
        let mut word = [0u8; 32];
        word.copy_from_slice(&wide[32..]);
        Some(word)
    }

    /// Narrow to a 256-bit integer. `None` when out of range.
    pub fn to_u256(&self) -> Option<U256> {
        self.to_uint256_bytes().map(|word| U256::from_big_endian(&word))
    }

    /// Addition that reports overflow instead of panicking.
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtraction that reports underflow instead of panicking.
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl From<u64> for BoundedAmount {
    fn from(value: u64) -> Self {
        Self(U512::from(value))
    }
}

impl From<U256> for BoundedAmount {
    fn from(value: U256) -> Self {
        let mut word = [0u8; 32];
        value.to_big_endian(&mut word);
        Self(U512::from_big_endian(&word))
    }
}

impl Add for BoundedAmount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

/// Panics on underflow. Callers compare against the balance first; the
/// amount type never clamps.
impl Sub for BoundedAmount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl std::iter::Sum for BoundedAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, x| acc + x)
    }
}

impl fmt::Display for BoundedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BoundedAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_string(s)
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

impl Serialize for BoundedAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_canonical_bytes())
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = BoundedAmount;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a canonical big-endian amount byte string")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        BoundedAmount::from_canonical_bytes(v).map_err(E::custom)
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        self.visit_bytes(&v)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        self.visit_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for BoundedAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bytes(AmountVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2^256 - 1
    const MAX_U256: &str =
        "115792089237316195423570985008687907853269984665640564039457584007913129639935";
    /// 2^256
    const TWO_POW_256: &str =
        "115792089237316195423570985008687907853269984665640564039457584007913129639936";

    #[test]
    fn parses_plain_decimals() {
        assert_eq!(BoundedAmount::from_decimal_string("0").unwrap(), BoundedAmount::zero());
        assert_eq!(
            BoundedAmount::from_decimal_string("1337").unwrap(),
            BoundedAmount::from(1337)
        );
        assert_eq!(
            BoundedAmount::from_decimal_string(MAX_U256).unwrap().to_string(),
            MAX_U256
        );
    }

    #[test]
    fn rejects_sign_and_garbage() {
        for input in ["", "-1", "+1", " 1", "1 ", "1.5", "0x10", "1e3", "one"] {
            match BoundedAmount::from_decimal_string(input) {
                Err(AmountError::InvalidDecimal { .. }) => {}
                other => panic!("expected InvalidDecimal for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn rejects_two_pow_256() {
        match BoundedAmount::from_decimal_string(TWO_POW_256) {
            Err(AmountError::OutOfRange { .. }) => {}
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn zero_is_single_zero_byte() {
        assert_eq!(BoundedAmount::zero().to_canonical_bytes(), vec![0]);
        assert_eq!(BoundedAmount::from(256).to_canonical_bytes(), vec![1, 0]);
    }

    #[test]
    fn non_canonical_bytes_rejected() {
        assert!(BoundedAmount::from_canonical_bytes(&[]).is_err());
        assert!(BoundedAmount::from_canonical_bytes(&[0, 1]).is_err());
        assert!(BoundedAmount::from_canonical_bytes(&[1u8; 65]).is_err());
        assert_eq!(
            BoundedAmount::from_canonical_bytes(&[1, 0]).unwrap(),
            BoundedAmount::from(256)
        );
    }

    #[test]
    fn wide_bytes_decode_but_fail_range() {
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&[0u8; 32]);
        let amount = BoundedAmount::from_canonical_bytes(&bytes).unwrap();
        assert!(!amount.is_within_range());
        assert!(amount.to_uint256_bytes().is_none());
    }

    #[test]
    fn uint256_word_is_left_padded() {
        let word = BoundedAmount::from(0x0102).to_uint256_bytes().unwrap();
        assert_eq!(&word[..30], &[0u8; 30]);
        assert_eq!(&word[30..], &[1, 2]);
    }

    #[test]
    fn arithmetic_and_sum() {
        let total: BoundedAmount = [1u64, 2, 3].iter().map(|v| BoundedAmount::from(*v)).sum();
        assert_eq!(total, BoundedAmount::from(6));
        assert_eq!(total - BoundedAmount::from(6), BoundedAmount::zero());
        assert!(BoundedAmount::from(1).checked_sub(&BoundedAmount::from(2)).is_none());
    }

    #[test]
    fn sum_of_max_values_does_not_wrap() {
        let max = BoundedAmount::from_decimal_string(MAX_U256).unwrap();
        let sum = max + max;
        assert!(!sum.is_within_range());
        assert!(sum > max);
    }

    #[test]
    fn bincode_uses_canonical_bytes() {
        let amount = BoundedAmount::from(100);
        let encoded = bincode::serialize(&amount).unwrap();
        let decoded: BoundedAmount = bincode::deserialize(&encoded).unwrap();
        assert_eq!(decoded, amount);

        let tampered = bincode::serialize(&vec![0u8, 100]).unwrap();
        assert!(bincode::deserialize::<BoundedAmount>(&tampered).is_err());
    }

    #[test]
    fn random_values_survive_decimal_round_trip() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let mut word = [0u8; 32];
            rng.fill(&mut word);
            let amount = BoundedAmount::from(U256::from_big_endian(&word));
            let reparsed = BoundedAmount::from_decimal_string(&amount.to_string()).unwrap();
            assert_eq!(reparsed, amount);
        }
    }
}
