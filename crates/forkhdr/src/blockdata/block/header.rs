//! Block header layouts.
//!
//! The chain forked into two header layouts that share their first 72 bytes
//! and one ambiguous 32-bit slot after them:
//! - [`LegacyHeader`] - the original 80-byte header, where the slot holds the
//!   timestamp
//! - [`ExtendedHeader`] - the post-fork header, where the slot holds the block
//!   height and is followed by reserved bytes, a 32-byte nonce and a
//!   variable-length solution
//!
//! [`is_extended`] tells the two apart from the slot value alone.

pub mod extended;
pub mod legacy;

use std::fmt;

pub use extended::{ExtendedHeader, Reserved};
pub use legacy::LegacyHeader;

use crate::{
    consensus::{Decodable, EncodeDecodeError, Encodable, Params},
    hashes::{BlockHash, Hash, TxMerkleNode},
    io::Read,
    pow::{CompactTarget, Target, difficulty_ratio},
};

/// Returns `true` if the shared slot value reads as a block height, meaning
/// the header uses the extended layout.
///
/// Zero is legacy. Values at or above [`LOCKTIME_THRESHOLD`] are timestamps,
/// so legacy. Everything in between is a height.
///
/// This is a value-range heuristic, not a protocol marker.
///
/// [`LOCKTIME_THRESHOLD`]: crate::consensus::LOCKTIME_THRESHOLD
pub fn is_extended(candidate: u32) -> bool {
    is_extended_with(candidate, &Params::MAINNET)
}

/// [`is_extended`] with the threshold taken from `params`.
pub fn is_extended_with(candidate: u32, params: &Params) -> bool {
    candidate != 0 && candidate < params.locktime_threshold
}

/// Common trait for the two header layouts.
///
/// Provides access to the fields both layouts carry and derives the block
/// hash, target and difficulty from them.
pub trait Header:
    Clone + PartialEq + Eq + fmt::Debug + Send + Sync + Encodable + Decodable
{
    /// The encoded size of the header without any variable-length part.
    const MIN_SIZE: usize;

    /// Block version.
    fn version(&self) -> i32;

    /// Retrieves the previous block hash from the header.
    fn previous_block_hash(&self) -> BlockHash;

    /// Merkle root of the block's transactions.
    fn merkle_root(&self) -> TxMerkleNode;

    /// Timestamp claimed by the miner, in seconds since the Unix epoch.
    fn timestamp(&self) -> u32;

    /// Compact proof-of-work target.
    fn bits(&self) -> CompactTarget;

    /// The value this header writes into the slot [`is_extended`] inspects.
    fn shared_slot(&self) -> u32;

    /// Compact target that counts as difficulty 1 for this layout.
    fn reference_bits(&self, params: &Params) -> CompactTarget;

    /// Computes the block hash, double SHA-256 over the encoded header.
    ///
    /// Nothing is cached here; see [`BlockHeader::id`] for the memoized form.
    ///
    /// [`BlockHeader::id`]: crate::blockdata::block::BlockHeader::id
    fn block_hash(&self) -> BlockHash {
        let mut engine = BlockHash::engine();
        #[allow(clippy::expect_used, reason = "Hash engines don't error")]
        self.consensus_encode(&mut engine)
            .expect("Hash engines don't error");
        BlockHash::from_engine(engine)
    }

    /// Decodes the header's compact target.
    fn target(&self) -> Target {
        Target::from_compact(self.bits())
    }

    /// Difficulty of this header relative to the layout's reference target.
    fn difficulty(&self, params: &Params) -> f64 {
        let reference = Target::from_compact(self.reference_bits(params));
        difficulty_ratio(&reference, &self.target())
    }
}

/// The fields both layouts start with, up to and including the ambiguous
/// slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SharedPrefix {
    pub(crate) version: i32,
    pub(crate) prev_blockhash: BlockHash,
    pub(crate) merkle_root: TxMerkleNode,
    pub(crate) time_or_height: u32,
}

impl Decodable for SharedPrefix {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, EncodeDecodeError> {
        Ok(SharedPrefix {
            version: Decodable::consensus_decode(reader)?,
            prev_blockhash: Decodable::consensus_decode(reader)?,
            merkle_root: Decodable::consensus_decode(reader)?,
            time_or_height: Decodable::consensus_decode(reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::LOCKTIME_THRESHOLD;

    #[test]
    fn test_zero_is_legacy() {
        assert!(!is_extended(0));
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(!is_extended(LOCKTIME_THRESHOLD));
        assert!(!is_extended(LOCKTIME_THRESHOLD + 1));
        assert!(is_extended(LOCKTIME_THRESHOLD - 1));
        assert!(!is_extended(u32::MAX));
    }

    #[test]
    fn test_heights_are_extended() {
        for height in [1, 2, 491_407, 1_000_000, 250_000_000] {
            assert!(is_extended(height), "height {height} should be extended");
        }
    }

    #[test]
    fn test_timestamps_are_legacy() {
        // genesis time and a 2017 timestamp
        assert!(!is_extended(1_231_006_505));
        assert!(!is_extended(1_510_000_000));
    }

    #[test]
    fn test_custom_threshold() {
        let params = Params {
            locktime_threshold: 100,
            ..Params::MAINNET
        };
        assert!(is_extended_with(99, &params));
        assert!(!is_extended_with(100, &params));
        assert!(is_extended(100));
    }
}
