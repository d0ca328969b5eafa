//! Pre-fork block header.
//!
//! The original 80-byte layout, identical to Bitcoin's block header.

use crate::{
    blockdata::block::header::{Header, SharedPrefix},
    consensus::{Decodable, EncodeDecodeError, Encodable, Params},
    hashes::{BlockHash, TxMerkleNode},
    io::{Error as IoError, Read, Write},
    pow::CompactTarget,
};

/// Pre-fork block header.
///
/// Wire layout: version(4) | prev_blockhash(32) | merkle_root(32) | time(4) |
/// bits(4) | nonce(4), all integers little-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LegacyHeader {
    /// Block version.
    pub version: i32,
    /// Reference to the previous block in the chain.
    pub prev_blockhash: BlockHash,
    /// The root hash of the merkle tree of transactions in the block.
    pub merkle_root: TxMerkleNode,
    /// The timestamp of the block, as claimed by the miner.
    ///
    /// Occupies the slot [`is_extended`] inspects, so for a header to decode
    /// back as legacy it must be zero or at least the locktime threshold.
    ///
    /// [`is_extended`]: crate::blockdata::block::header::is_extended
    pub time: u32,
    /// The target value below which the block hash must lie.
    pub bits: CompactTarget,
    /// The nonce, selected to obtain a low enough block hash.
    pub nonce: u32,
}

impl LegacyHeader {
    /// Size of a legacy header in bytes.
    pub const SIZE: usize = 4 + 32 + 32 + 4 + 4 + 4; // 80

    /// Decodes the fields that follow the shared prefix.
    pub(crate) fn decode_after_prefix<R: Read + ?Sized>(
        prefix: SharedPrefix,
        reader: &mut R,
    ) -> Result<Self, EncodeDecodeError> {
        Ok(LegacyHeader {
            version: prefix.version,
            prev_blockhash: prefix.prev_blockhash,
            merkle_root: prefix.merkle_root,
            time: prefix.time_or_height,
            bits: Decodable::consensus_decode(reader)?,
            nonce: Decodable::consensus_decode(reader)?,
        })
    }
}

impl Encodable for LegacyHeader {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, IoError> {
        let mut len: usize = 0;
        len = len.saturating_add(self.version.consensus_encode(writer)?);
        len = len.saturating_add(self.prev_blockhash.consensus_encode(writer)?);
        len = len.saturating_add(self.merkle_root.consensus_encode(writer)?);
        len = len.saturating_add(self.time.consensus_encode(writer)?);
        len = len.saturating_add(self.bits.consensus_encode(writer)?);
        len = len.saturating_add(self.nonce.consensus_encode(writer)?);
        Ok(len)
    }
}

impl Decodable for LegacyHeader {
    /// Decodes a legacy header without consulting the layout detector.
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, EncodeDecodeError> {
        let prefix = SharedPrefix::consensus_decode(reader)?;
        Self::decode_after_prefix(prefix, reader)
    }
}

impl Header for LegacyHeader {
    const MIN_SIZE: usize = Self::SIZE;

    fn version(&self) -> i32 {
        self.version
    }

    fn previous_block_hash(&self) -> BlockHash {
        self.prev_blockhash
    }

    fn merkle_root(&self) -> TxMerkleNode {
        self.merkle_root
    }

    fn timestamp(&self) -> u32 {
        self.time
    }

    fn bits(&self) -> CompactTarget {
        self.bits
    }

    fn shared_slot(&self) -> u32 {
        self.time
    }

    fn reference_bits(&self, params: &Params) -> CompactTarget {
        params.legacy_genesis_bits
    }
}
