use crate::pow::CompactTarget;

/// Values at or above this are read as a timestamp, values below it (and above
/// zero) as a block height.
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// Compact target of the pre-fork genesis block, the difficulty-1 reference
/// for legacy headers.
pub const LEGACY_GENESIS_BITS: u32 = 0x1d00ffff;

/// Compact target of the first post-fork block, the difficulty-1 reference for
/// extended headers.
pub const EXTENDED_GENESIS_BITS: u32 = 0x1f7fffff;

/// How far into the future, in seconds, a header timestamp may lie.
pub const MAX_TIME_OFFSET: u32 = 2 * 60 * 60;

/// Bytes preceding the header in a raw serialized block (magic + size).
pub const START_OF_HEADER: usize = 8;

/// Header codec and validation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    /// Boundary between block heights and timestamps in the shared header slot.
    pub locktime_threshold: u32,
    /// Difficulty-1 reference target for legacy headers.
    pub legacy_genesis_bits: CompactTarget,
    /// Difficulty-1 reference target for extended headers.
    pub extended_genesis_bits: CompactTarget,
    /// Allowed clock drift into the future for header timestamps, in seconds.
    pub max_time_offset: u32,
    /// Length of the prefix skipped by the raw-block entry point.
    pub start_of_header: usize,
}

impl Params {
    /// Parameters of the live network.
    pub const MAINNET: Self = Self {
        locktime_threshold: LOCKTIME_THRESHOLD,
        legacy_genesis_bits: CompactTarget::from_consensus(LEGACY_GENESIS_BITS),
        extended_genesis_bits: CompactTarget::from_consensus(EXTENDED_GENESIS_BITS),
        max_time_offset: MAX_TIME_OFFSET,
        start_of_header: START_OF_HEADER,
    };
}

impl Default for Params {
    fn default() -> Self {
        Self::MAINNET
    }
}
