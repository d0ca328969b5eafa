//! Genesis block information.

use serde::{Deserialize, Serialize};

use crate::{
    blockdata::block::{BlockHeader, HeaderError, LegacyHeader},
    consensus::serialize,
    hashes::{BlockHash, Hash, TxMerkleNode},
    pow::CompactTarget,
};

/// Genesis block information.
///
/// The chain shares its pre-fork history, and so its genesis block, with
/// Bitcoin. The genesis header is a legacy header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisInfo {
    /// The hash of the genesis block.
    pub hash: BlockHash,
    /// The merkle root of the genesis block.
    pub merkle_root: TxMerkleNode,
    /// The timestamp of the genesis block.
    pub timestamp: u32,
    /// The nonce of the genesis block.
    pub nonce: u32,
    /// The bits (difficulty) of the genesis block.
    pub bits: CompactTarget,
    /// The version of the genesis block.
    pub version: i32,
}

impl GenesisInfo {
    /// Returns the genesis block information for the live network.
    pub fn mainnet() -> Self {
        Self {
            hash: BlockHash::from_byte_array([
                0x6f, 0xe2, 0x8c, 0x0a, 0xb6, 0xf1, 0xb3, 0x72, 0xc1, 0xa6, 0xa2, 0x46, 0xae, 0x63,
                0xf7, 0x4f, 0x93, 0x1e, 0x83, 0x65, 0xe1, 0x5a, 0x08, 0x9c, 0x68, 0xd6, 0x19, 0x00,
                0x00, 0x00, 0x00, 0x00,
            ]),
            merkle_root: TxMerkleNode::from_byte_array([
                0x3b, 0xa3, 0xed, 0xfd, 0x7a, 0x7b, 0x12, 0xb2, 0x7a, 0xc7, 0x2c, 0x3e, 0x67, 0x76,
                0x8f, 0x61, 0x7f, 0xc8, 0x1b, 0xc3, 0x88, 0x8a, 0x51, 0x32, 0x3a, 0x9f, 0xb8, 0xaa,
                0x4b, 0x1e, 0x5e, 0x4a,
            ]),
            timestamp: 1231006505,
            nonce: 2083236893,
            bits: CompactTarget::from_consensus(0x1d00ffff),
            version: 1,
        }
    }

    /// The genesis header fields. The previous block hash is all zeros.
    pub fn to_legacy_header(&self) -> LegacyHeader {
        LegacyHeader {
            version: self.version,
            prev_blockhash: BlockHash::all_zeros(),
            merkle_root: self.merkle_root,
            time: self.timestamp,
            bits: self.bits,
            nonce: self.nonce,
        }
    }

    /// Builds the genesis header, checking it against [`hash`](Self::hash).
    pub fn to_header(&self) -> Result<BlockHeader, HeaderError> {
        BlockHeader::with_expected_hash(self.to_legacy_header(), self.hash)
    }

    /// The serialized 80-byte genesis header.
    pub fn header_bytes(&self) -> Vec<u8> {
        serialize(&self.to_legacy_header())
    }
}

#[cfg(test)]
mod tests {
    use hex::FromHex;

    use super::*;

    #[test]
    fn test_genesis_info() {
        let genesis = GenesisInfo::mainnet();
        assert_eq!(
            genesis.hash.to_string(),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
        assert_eq!(
            genesis.merkle_root.to_string(),
            "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
        );
        assert_eq!(genesis.timestamp, 1231006505);
        assert_eq!(genesis.nonce, 2083236893);
        assert_eq!(genesis.bits.to_consensus(), 0x1d00ffff);
        assert_eq!(genesis.version, 1);
    }

    #[test]
    fn test_genesis_header() {
        let genesis = GenesisInfo::mainnet();
        let expected = Vec::from_hex(
            "01000000\
             0000000000000000000000000000000000000000000000000000000000000000\
             3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a\
             29ab5f49\
             ffff001d\
             1dac2b7c",
        )
        .unwrap();
        assert_eq!(genesis.header_bytes(), expected);

        let header = genesis.to_header().unwrap();
        assert_eq!(header.id(), genesis.hash);
        assert!(!header.is_extended());
        assert_eq!(header.difficulty(), 1.0);
    }
}
