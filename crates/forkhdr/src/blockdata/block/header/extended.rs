//! Post-fork block header.
//!
//! The extended layout puts the block height where the legacy layout has its
//! timestamp, then carries 28 reserved bytes, the timestamp and bits, a
//! 32-byte nonce and a length-prefixed proof-of-work solution.

use std::fmt;

use crate::{
    blockdata::block::header::{Header, SharedPrefix},
    consensus::{Decodable, EncodeDecodeError, Encodable, Params},
    hashes::{BlockHash, TxMerkleNode},
    io::{Error as IoError, Read, Write},
    pow::CompactTarget,
    util::to_reversed_hex,
};

const RESERVED_LEN: usize = 28;

/// The 28 reserved bytes following the height in an extended header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Reserved(pub [u8; RESERVED_LEN]);

impl Reserved {
    /// Length of the reserved field in bytes.
    pub const LEN: usize = RESERVED_LEN;

    /// Returns the bytes in wire order.
    pub fn as_bytes(&self) -> &[u8; Reserved::LEN] {
        &self.0
    }
}

impl From<[u8; Reserved::LEN]> for Reserved {
    fn from(bytes: [u8; Reserved::LEN]) -> Self {
        Reserved(bytes)
    }
}

impl fmt::Display for Reserved {
    /// Formats the bytes as hex in display (reversed) order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_reversed_hex(&self.0))
    }
}

impl Encodable for Reserved {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, IoError> {
        writer.write_all(&self.0)?;
        Ok(Reserved::LEN)
    }
}

impl Decodable for Reserved {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, EncodeDecodeError> {
        let mut bytes = [0u8; Reserved::LEN];
        reader.read_exact(&mut bytes)?;
        Ok(Reserved(bytes))
    }
}

/// Post-fork block header.
///
/// Wire layout: version(4) | prev_blockhash(32) | merkle_root(32) |
/// height(4) | reserved(28) | time(4) | bits(4) | nonce(32) |
/// varint(solution length) | solution.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExtendedHeader {
    /// Block version.
    pub version: i32,
    /// Reference to the previous block in the chain.
    pub prev_blockhash: BlockHash,
    /// The root hash of the merkle tree of transactions in the block.
    pub merkle_root: TxMerkleNode,
    /// Height of the block.
    ///
    /// Occupies the slot [`is_extended`] inspects, so it must be non-zero and
    /// below the locktime threshold.
    ///
    /// [`is_extended`]: crate::blockdata::block::header::is_extended
    pub height: u32,
    /// Reserved bytes, in wire order.
    pub reserved: Reserved,
    /// The timestamp of the block, as claimed by the miner.
    pub time: u32,
    /// The target value below which the block hash must lie.
    pub bits: CompactTarget,
    /// The 256-bit nonce, in wire order.
    pub nonce: [u8; 32],
    /// The proof-of-work solution. Unlike the nonce, its hex form is not
    /// reversed.
    pub solution: Vec<u8>,
}

impl ExtendedHeader {
    /// Decodes the fields that follow the shared prefix.
    pub(crate) fn decode_after_prefix<R: Read + ?Sized>(
        prefix: SharedPrefix,
        reader: &mut R,
    ) -> Result<Self, EncodeDecodeError> {
        Ok(ExtendedHeader {
            version: prefix.version,
            prev_blockhash: prefix.prev_blockhash,
            merkle_root: prefix.merkle_root,
            height: prefix.time_or_height,
            reserved: Decodable::consensus_decode(reader)?,
            time: Decodable::consensus_decode(reader)?,
            bits: Decodable::consensus_decode(reader)?,
            nonce: Decodable::consensus_decode(reader)?,
            // Reads the varint length prefix, then that many bytes.
            solution: Decodable::consensus_decode(reader)?,
        })
    }
}

impl Encodable for ExtendedHeader {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, IoError> {
        let mut len: usize = 0;
        len = len.saturating_add(self.version.consensus_encode(writer)?);
        len = len.saturating_add(self.prev_blockhash.consensus_encode(writer)?);
        len = len.saturating_add(self.merkle_root.consensus_encode(writer)?);
        len = len.saturating_add(self.height.consensus_encode(writer)?);
        len = len.saturating_add(self.reserved.consensus_encode(writer)?);
        len = len.saturating_add(self.time.consensus_encode(writer)?);
        len = len.saturating_add(self.bits.consensus_encode(writer)?);
        len = len.saturating_add(self.nonce.consensus_encode(writer)?);
        // Writes the varint length prefix before the bytes.
        len = len.saturating_add(self.solution.consensus_encode(writer)?);
        Ok(len)
    }
}

impl Decodable for ExtendedHeader {
    /// Decodes an extended header without consulting the layout detector.
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, EncodeDecodeError> {
        let prefix = SharedPrefix::consensus_decode(reader)?;
        Self::decode_after_prefix(prefix, reader)
    }
}

impl Header for ExtendedHeader {
    /// An extended header with an empty solution.
    const MIN_SIZE: usize = 4 + 32 + 32 + 4 + Reserved::LEN + 4 + 4 + 32 + 1; // 141

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
        self.height
    }

    fn reference_bits(&self, params: &Params) -> CompactTarget {
        params.extended_genesis_bits
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use hex::FromHex;

    use super::*;
    use crate::consensus::VarInt;

    // version 0x20000000, height 491407, reserved 01..1c, time 1510000000,
    // bits 0x1d00ffff, nonce ..deadbeef, 5-byte solution
    const EXTENDED_HEX: &str = "\
        00000020\
        8090a1b2c3d6e4f0a2b1c5a0d8e6699aa4f1e9b1b6a40a000000000000000000\
        a0b1c2d3e4f5061728394a5b6c7d8e9f0415263748596a7b8c9d0e1f2c3a1d4b\
        8f7f0700\
        0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c\
        80c5005a\
        ffff001d\
        efbeadde00000000000000000000000000000000000000000000000000000000\
        05\
        0badc0ffee";

    fn sample() -> ExtendedHeader {
        let mut reserved = [0u8; Reserved::LEN];
        for (i, byte) in reserved.iter_mut().enumerate() {
            *byte = u8::try_from(i + 1).unwrap();
        }
        let mut nonce = [0u8; 32];
        nonce[..4].copy_from_slice(&[0xef, 0xbe, 0xad, 0xde]);
        ExtendedHeader {
            version: 0x20000000,
            prev_blockhash: BlockHash::from_str(
                "0000000000000000000aa4b6b1e9f1a49a69e6d8a0c5b1a2f0e4d6c3b2a19080",
            )
            .unwrap(),
            merkle_root: TxMerkleNode::from_str(
                "4b1d3a2c1f0e9d8c7b6a5948372615049f8e7d6c5b4a39281706f5e4d3c2b1a0",
            )
            .unwrap(),
            height: 491_407,
            reserved: Reserved(reserved),
            time: 1_510_000_000,
            bits: CompactTarget::from_consensus(0x1d00ffff),
            nonce,
            solution: vec![0x0b, 0xad, 0xc0, 0xff, 0xee],
        }
    }

    #[test]
    fn test_extended_header_encoding() {
        let header = sample();
        let mut encoded = Vec::new();
        let written = header.consensus_encode(&mut encoded).unwrap();
        assert_eq!(written, ExtendedHeader::MIN_SIZE + 5);
        assert_eq!(encoded, Vec::from_hex(EXTENDED_HEX).unwrap());
    }

    #[test]
    fn test_extended_header_decoding() {
        let bytes = Vec::from_hex(EXTENDED_HEX).unwrap();
        let mut cursor = bitcoin::io::Cursor::new(&bytes);
        let header = ExtendedHeader::consensus_decode(&mut cursor).unwrap();
        assert_eq!(header, sample());
        assert_eq!(cursor.position(), bytes.len() as u64);
    }

    #[test]
    fn test_extended_block_hash() {
        assert_eq!(
            sample().block_hash().to_string(),
            "94a7056c6f4cc877c12022de21a1fd254015565bd1e9e5d735ac24ea77cadf14"
        );
    }

    #[test]
    fn test_solution_length_prefix() {
        let mut header = sample();
        header.solution = vec![0x42; 1344];
        let mut encoded = Vec::new();
        header.consensus_encode(&mut encoded).unwrap();

        let prefix_start = ExtendedHeader::MIN_SIZE - 1;
        let mut prefix = &encoded[prefix_start..];
        let len = VarInt::consensus_decode(&mut prefix).unwrap();
        assert_eq!(len.0, 1344);
        // 0xfd marker plus two length bytes
        assert_eq!(encoded.len(), prefix_start + 3 + 1344);

        let mut cursor = bitcoin::io::Cursor::new(&encoded);
        assert_eq!(ExtendedHeader::consensus_decode(&mut cursor).unwrap(), header);
    }

    #[test]
    fn test_truncated_solution() {
        let mut bytes = Vec::from_hex(EXTENDED_HEX).unwrap();
        bytes.pop();
        let mut cursor = bitcoin::io::Cursor::new(&bytes);
        assert!(ExtendedHeader::consensus_decode(&mut cursor).is_err());
    }

    #[test]
    fn test_reserved_display_is_reversed() {
        let reserved = sample().reserved;
        assert!(reserved.to_string().starts_with("1c1b1a"));
        assert!(reserved.to_string().ends_with("030201"));
    }
}
