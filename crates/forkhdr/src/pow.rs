//! Proof-of-work targets and difficulty.
//!
//! This module defines the [`Target`] and [`CompactTarget`] types used to
//! express the proof-of-work threshold a header id must not exceed.
//!
//! A [`Target`] is an unsigned integer of arbitrary width. Compact targets with
//! large exponents decode to values wider than 256 bits, and the difficulty
//! reference is scaled by 10^8 before dividing, so a fixed-width integer is
//! not enough here. [`CompactTarget`] is the 32-bit "bits" field found in
//! every header.

use std::fmt;

use bitcoin::BlockHash;
use num_bigint::BigUint;
use num_traits::Zero;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{
    consensus::{Decodable, EncodeDecodeError, Encodable},
    hashes::Hash,
    io::{Error as IoError, Read, Write},
};

/// Number of decimal places kept by [`difficulty_ratio`].
const DIFFICULTY_DECIMALS: usize = 8;

/// The largest possible target: 2^256, above every 256-bit hash.
pub static LARGEST_HASH: Lazy<Target> = Lazy::new(|| Target(BigUint::from(1u8) << 256u32));

/// Represents a proof-of-work target as an unsigned big integer.
///
/// # Example
///
/// ```
/// use forkhdr::pow::{CompactTarget, Target};
///
/// let target = Target::from_compact(CompactTarget::from_consensus(0x1d00ffff));
/// assert_eq!(
///     target.to_string(),
///     "ffff0000000000000000000000000000000000000000000000000000"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Target(BigUint);

impl Target {
    /// Wraps an existing big integer.
    pub fn new(value: BigUint) -> Self {
        Target(value)
    }

    /// Parses a target from a big-endian hex string.
    ///
    /// # Returns
    ///
    /// * `Some(Target)` - If `hex` contains only hex digits
    /// * `None` - If `hex` is empty or contains anything else
    pub fn from_hex(hex: &str) -> Option<Self> {
        BigUint::parse_bytes(hex.as_bytes(), 16).map(Target)
    }

    /// Interprets a block id as an integer, the way its reversed-hex display
    /// form reads.
    pub fn from_hash(hash: BlockHash) -> Self {
        // Wire order is little-endian; the display form is the reversal.
        Target(BigUint::from_bytes_le(hash.as_byte_array()))
    }

    /// The largest possible target, see [`LARGEST_HASH`].
    pub fn largest() -> Self {
        LARGEST_HASH.clone()
    }

    /// Decodes a compact target.
    ///
    /// The low 24 bits are the mantissa, the high 8 bits the exponent. For
    /// exponents above 3 the mantissa is shifted left by `8 * (exponent - 3)`
    /// bits. For exponents of 3 or less the mantissa is returned unchanged:
    /// no right shift is applied, and the mantissa's high bit is not treated
    /// as a sign.
    pub fn from_compact(compact: CompactTarget) -> Self {
        let bits = compact.to_consensus();
        let mantissa = BigUint::from(bits & 0x00ff_ffff);
        let exponent = bits >> 24;

        match exponent.checked_sub(3) {
            Some(excess) if excess > 0 => {
                // At most 8 * 252, far from overflowing.
                let shift = excess.saturating_mul(8);
                Target(mantissa << shift)
            }
            _ => Target(mantissa),
        }
    }

    /// Returns `true` if the target is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns the underlying integer.
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Display for Target {
    /// Formats the target as lowercase hex without leading zeros.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl From<CompactTarget> for Target {
    fn from(compact: CompactTarget) -> Self {
        Target::from_compact(compact)
    }
}

/// Computes the difficulty of `current` relative to `reference`.
///
/// The reference is scaled by 10^8, divided by `current` with integer
/// division, and the decimal digits of the quotient are split 8 places from
/// the end before being parsed as a float. The result is truncated, not
/// rounded, to 8 decimal places. Quotients shorter than 9 digits are
/// left-padded with zeros first, so the integer part is at least `0`. A zero
/// `current` target yields `1.0`.
///
/// ```
/// use forkhdr::pow::{CompactTarget, Target, difficulty_ratio};
///
/// let reference = Target::from_compact(CompactTarget::from_consensus(0x1d00ffff));
/// let current = Target::from_compact(CompactTarget::from_consensus(0x1b0404cb));
/// assert_eq!(difficulty_ratio(&reference, &current), 16307.42093852);
/// ```
#[allow(clippy::expect_used, reason = "Decimal digits around a point always parse")]
pub fn difficulty_ratio(reference: &Target, current: &Target) -> f64 {
    if current.is_zero() {
        return 1.0;
    }

    let scaled = &reference.0 * BigUint::from(100_000_000u32);
    let digits = (scaled / &current.0).to_str_radix(10);

    // Short quotients are padded so the split always leaves an integer part.
    let digits = format!("{digits:0>width$}", width = DIFFICULTY_DECIMALS.saturating_add(1));
    let (integer, fraction) = digits.split_at(digits.len().saturating_sub(DIFFICULTY_DECIMALS));

    format!("{integer}.{fraction}")
        .parse()
        .expect("Decimal digits around a point always parse")
}

/// The compact "bits" encoding of a target, as stored in a header.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CompactTarget(u32);

impl CompactTarget {
    /// Creates a compact target from its raw header value.
    pub const fn from_consensus(bits: u32) -> Self {
        CompactTarget(bits)
    }

    /// Returns the raw header value.
    pub const fn to_consensus(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<u32> for CompactTarget {
    fn from(bits: u32) -> Self {
        CompactTarget(bits)
    }
}

impl From<CompactTarget> for u32 {
    fn from(compact: CompactTarget) -> Self {
        compact.0
    }
}

impl Encodable for CompactTarget {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, IoError> {
        self.0.consensus_encode(writer)
    }
}

impl Decodable for CompactTarget {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, EncodeDecodeError> {
        Ok(CompactTarget(u32::consensus_decode(reader)?))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn target(bits: u32) -> Target {
        Target::from_compact(CompactTarget::from_consensus(bits))
    }

    #[test]
    fn test_genesis_block_target() {
        // 0x00ffff * 256^(0x1d - 3)
        let expected =
            Target::from_hex("00000000ffff0000000000000000000000000000000000000000000000000000")
                .unwrap();
        assert_eq!(target(0x1d00ffff), expected);
    }

    #[test]
    fn test_extended_genesis_target() {
        let expected =
            Target::from_hex("007fffff00000000000000000000000000000000000000000000000000000000")
                .unwrap();
        assert_eq!(target(0x1f7fffff), expected);
    }

    #[test]
    fn test_small_exponent_is_not_shifted_right() {
        // exponent 1 would shift the mantissa right by 16 bits in Bitcoin Core
        assert_eq!(target(0x01123456), Target::new(BigUint::from(0x123456u32)));
        assert_eq!(target(0x03123456), Target::new(BigUint::from(0x123456u32)));
        assert_eq!(target(0x00000000), Target::default());
    }

    #[test]
    fn test_mantissa_sign_bit_is_kept() {
        assert_eq!(
            target(0x04800000),
            Target::new(BigUint::from(0x80000000u32))
        );
    }

    #[test]
    fn test_exponent_beyond_256_bits() {
        // 8 * (35 - 3) = 256
        assert_eq!(target(0x23000001), Target::largest());
        let huge = target(0xff7fffff);
        assert!(huge > Target::largest());
        assert_eq!(huge.as_biguint().bits(), 23 + 8 * 252);
    }

    #[test]
    fn test_largest_hash_is_above_every_hash() {
        let max_hash = BlockHash::from_byte_array([0xff; 32]);
        assert!(Target::from_hash(max_hash) < Target::largest());
        assert_eq!(
            Target::largest().to_string(),
            format!("1{}", "0".repeat(64))
        );
    }

    #[test]
    fn test_from_hash_reads_display_order() {
        let hash = BlockHash::from_str(
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f",
        )
        .unwrap();
        assert_eq!(
            Target::from_hash(hash),
            Target::from_hex("19d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f").unwrap()
        );
    }

    #[test]
    fn test_difficulty_one() {
        assert_eq!(difficulty_ratio(&target(0x1d00ffff), &target(0x1d00ffff)), 1.0);
        assert_eq!(difficulty_ratio(&target(0x1f7fffff), &target(0x1f7fffff)), 1.0);
    }

    #[test]
    fn test_difficulty_is_truncated_to_eight_places() {
        let reference = target(0x1d00ffff);
        // Floating-point division gives 16307.420938523983.
        assert_eq!(difficulty_ratio(&reference, &target(0x1b0404cb)), 16307.42093852);
        assert_eq!(difficulty_ratio(&reference, &target(0x1c0ffff0)), 16.0);
        assert_eq!(
            difficulty_ratio(&reference, &target(0x18009645)),
            1873105475221.611
        );
    }

    #[test]
    fn test_difficulty_below_one() {
        let reference = target(0x1d00ffff);
        assert_eq!(difficulty_ratio(&reference, &target(0x1e0fffff)), 0.00024413);
        assert_eq!(difficulty_ratio(&reference, &target(0x1f7fffff)), 0.00000011);
        assert_eq!(difficulty_ratio(&reference, &target(0x207fffff)), 0.0);
    }

    #[test]
    fn test_difficulty_zero_target_guard() {
        assert_eq!(difficulty_ratio(&target(0x1d00ffff), &target(0x1d000000)), 1.0);
        assert_eq!(difficulty_ratio(&target(0x1d00ffff), &Target::default()), 1.0);
    }

    #[test]
    fn test_compact_target_encoding() {
        let compact = CompactTarget::from_consensus(0x1d00ffff);
        let bytes = bitcoin::consensus::serialize(&compact);
        assert_eq!(bytes, vec![0xff, 0xff, 0x00, 0x1d]);
        let decoded: CompactTarget = bitcoin::consensus::deserialize(&bytes).unwrap();
        assert_eq!(decoded, compact);
        assert_eq!(compact.to_string(), "0x1d00ffff");
    }
}
