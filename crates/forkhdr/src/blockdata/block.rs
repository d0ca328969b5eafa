mod fields;
pub mod header;
mod validation;

use std::{fmt, str::FromStr};

pub use fields::{HeaderFields, NonceField};
pub use header::{
    ExtendedHeader, Header, LegacyHeader, Reserved, is_extended, is_extended_with,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
pub use validation::ValidationError;

use crate::{
    blockdata::block::header::SharedPrefix,
    consensus::{Decodable, EncodeDecodeError, Encodable, Params, serialize},
    hashes::{BlockHash, TxMerkleNode},
    io::{Cursor, Error as IoError, Read, Write},
    pow::{CompactTarget, Target},
};

/// Errors that can occur while building a [`BlockHeader`].
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The input is of a kind no header can be built from.
    #[error("unrecognized header input: {0}")]
    UnrecognizedInput(&'static str),

    /// A field required by the chosen layout is absent.
    #[error("missing header field: {0}")]
    MissingField(&'static str),

    /// A field is present but cannot be used.
    #[error("invalid header field {field}: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Header bytes given as hex could not be decoded.
    #[error("invalid header hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// A JSON field mapping could not be parsed.
    #[error("malformed header fields: {0}")]
    Json(#[from] serde_json::Error),

    /// A hash supplied alongside the fields does not match the fields.
    #[error("header hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch {
        /// The hash the caller supplied.
        expected: BlockHash,
        /// The hash of the header as built.
        computed: BlockHash,
    },

    /// The shared slot value would be read back as the other layout.
    #[error("shared slot value {slot} does not describe a {layout} header")]
    InconsistentLayout {
        /// Legacy time or extended height.
        slot: u32,
        /// The layout the header was built as.
        layout: &'static str,
    },

    /// The underlying reader ran out of bytes or met malformed data.
    #[error("header decode error: {0}")]
    Decode(#[from] EncodeDecodeError),
}

/// One of the two header wire layouts.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HeaderLayout {
    /// Pre-fork 80-byte header.
    Legacy(LegacyHeader),
    /// Post-fork header with height, 256-bit nonce and solution.
    Extended(ExtendedHeader),
}

/// Dispatches a [`Header`] method over both layouts.
macro_rules! with_header {
    ($layout:expr, $header:ident => $body:expr) => {
        match $layout {
            HeaderLayout::Legacy($header) => $body,
            HeaderLayout::Extended($header) => $body,
        }
    };
}

impl HeaderLayout {
    /// Returns `true` for the post-fork layout.
    pub fn is_extended(&self) -> bool {
        matches!(self, HeaderLayout::Extended(_))
    }

    /// Lowercase name of the layout.
    pub fn name(&self) -> &'static str {
        match self {
            HeaderLayout::Legacy(_) => "legacy",
            HeaderLayout::Extended(_) => "extended",
        }
    }

    /// Checks that the detector reads this layout's shared slot back as the
    /// same layout.
    fn check_consistent(&self, params: &Params) -> Result<(), HeaderError> {
        let slot = with_header!(self, h => h.shared_slot());
        if is_extended_with(slot, params) == self.is_extended() {
            Ok(())
        } else {
            Err(HeaderError::InconsistentLayout {
                slot,
                layout: self.name(),
            })
        }
    }
}

impl From<LegacyHeader> for HeaderLayout {
    fn from(header: LegacyHeader) -> Self {
        HeaderLayout::Legacy(header)
    }
}

impl From<ExtendedHeader> for HeaderLayout {
    fn from(header: ExtendedHeader) -> Self {
        HeaderLayout::Extended(header)
    }
}

impl Encodable for HeaderLayout {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, IoError> {
        with_header!(self, h => h.consensus_encode(writer))
    }
}

/// A block header of either layout, with its id memoized.
///
/// A `BlockHeader` is immutable: to change a field, take the layout out with
/// [`into_layout`](Self::into_layout), edit it and build a new header. The id
/// is computed on first use and never recomputed.
///
/// # Example
///
/// ```
/// use forkhdr::BlockHeader;
///
/// let hex = "0100000000000000000000000000000000000000000000000000000000000000\
///            000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa\
///            4b1e5e4a29ab5f49ffff001d1dac2b7c";
/// let header: BlockHeader = hex.parse()?;
/// assert!(!header.is_extended());
/// assert_eq!(
///     header.id().to_string(),
///     "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
/// );
/// # Ok::<(), forkhdr::HeaderError>(())
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "HeaderFields", try_from = "HeaderFields")]
pub struct BlockHeader {
    layout: HeaderLayout,
    id: OnceCell<BlockHash>,
}

impl BlockHeader {
    /// Wraps a layout, checking that it re-decodes as the same layout.
    ///
    /// # Errors
    ///
    /// * `HeaderError::InconsistentLayout` - If a legacy time falls in the
    ///   height range, or an extended height does not
    pub fn new(layout: impl Into<HeaderLayout>) -> Result<Self, HeaderError> {
        Self::new_with(layout, &Params::MAINNET)
    }

    /// [`new`](Self::new) with the detector threshold taken from `params`.
    pub fn new_with(layout: impl Into<HeaderLayout>, params: &Params) -> Result<Self, HeaderError> {
        let layout = layout.into();
        layout.check_consistent(params)?;
        Ok(Self::from_layout_unchecked(layout))
    }

    /// Wraps a layout and checks it against a hash supplied by the caller.
    ///
    /// # Errors
    ///
    /// * `HeaderError::HashMismatch` - If `expected` differs from the computed
    ///   id
    /// * `HeaderError::InconsistentLayout` - See [`new`](Self::new)
    pub fn with_expected_hash(
        layout: impl Into<HeaderLayout>,
        expected: BlockHash,
    ) -> Result<Self, HeaderError> {
        let header = Self::new(layout)?;
        header.check_hash(expected)?;
        Ok(header)
    }

    fn from_layout_unchecked(layout: HeaderLayout) -> Self {
        BlockHeader {
            layout,
            id: OnceCell::new(),
        }
    }

    pub(crate) fn check_hash(&self, expected: BlockHash) -> Result<(), HeaderError> {
        let computed = self.id();
        if computed == expected {
            Ok(())
        } else {
            tracing::warn!(%expected, %computed, "header hash mismatch");
            Err(HeaderError::HashMismatch { expected, computed })
        }
    }

    /// Decodes a header from the start of `bytes`, choosing the layout from
    /// the shared slot. Bytes after the header are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HeaderError> {
        let mut cursor = Cursor::new(bytes);
        Ok(Self::decode_with(&mut cursor, &Params::MAINNET)?)
    }

    /// Decodes a header from hex-encoded bytes.
    pub fn from_hex(hex: &str) -> Result<Self, HeaderError> {
        let bytes = hex::decode(hex)?;
        Self::from_bytes(&bytes)
    }

    /// Decodes the header of a full serialized block, skipping the 8-byte
    /// magic and size prefix. The transactions that follow are not read.
    pub fn from_raw_block(raw: &[u8]) -> Result<Self, HeaderError> {
        Self::from_raw_block_with(raw, &Params::MAINNET)
    }

    /// [`from_raw_block`](Self::from_raw_block) with the prefix length and
    /// detector threshold taken from `params`.
    pub fn from_raw_block_with(raw: &[u8], params: &Params) -> Result<Self, HeaderError> {
        // A block shorter than the prefix leaves nothing to read, and the
        // reader reports the missing bytes.
        let header_bytes = raw.get(params.start_of_header..).unwrap_or_default();
        let mut cursor = Cursor::new(header_bytes);
        Ok(Self::decode_with(&mut cursor, params)?)
    }

    /// Decodes a header from `reader`, choosing the layout with `params`.
    pub fn decode_with<R: Read + ?Sized>(
        reader: &mut R,
        params: &Params,
    ) -> Result<Self, EncodeDecodeError> {
        let prefix = SharedPrefix::consensus_decode(reader)?;
        let layout = if is_extended_with(prefix.time_or_height, params) {
            debug!(height = prefix.time_or_height, "decoding extended header");
            HeaderLayout::Extended(ExtendedHeader::decode_after_prefix(prefix, reader)?)
        } else {
            debug!(time = prefix.time_or_height, "decoding legacy header");
            HeaderLayout::Legacy(LegacyHeader::decode_after_prefix(prefix, reader)?)
        };
        Ok(Self::from_layout_unchecked(layout))
    }

    /// Serializes the header in its wire layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        serialize(self)
    }

    /// Serializes the header and hex-encodes it.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Returns the header's layout.
    pub fn layout(&self) -> &HeaderLayout {
        &self.layout
    }

    /// Consumes the header, returning its layout.
    pub fn into_layout(self) -> HeaderLayout {
        self.layout
    }

    /// Returns `true` for a post-fork header.
    pub fn is_extended(&self) -> bool {
        self.layout.is_extended()
    }

    /// The block id, double SHA-256 of the serialized header.
    ///
    /// Computed on the first call and cached for the lifetime of this value.
    /// There is no invalidation path.
    pub fn id(&self) -> BlockHash {
        *self.id.get_or_init(|| {
            let id = with_header!(&self.layout, h => h.block_hash());
            debug!(%id, layout = self.layout.name(), "computed header id");
            id
        })
    }

    /// Block version.
    pub fn version(&self) -> i32 {
        with_header!(&self.layout, h => h.version())
    }

    /// Hash of the previous block.
    pub fn prev_blockhash(&self) -> BlockHash {
        with_header!(&self.layout, h => h.previous_block_hash())
    }

    /// Merkle root of the block's transactions.
    pub fn merkle_root(&self) -> TxMerkleNode {
        with_header!(&self.layout, h => h.merkle_root())
    }

    /// Timestamp claimed by the miner.
    pub fn time(&self) -> u32 {
        with_header!(&self.layout, h => h.timestamp())
    }

    /// Compact proof-of-work target.
    pub fn bits(&self) -> CompactTarget {
        with_header!(&self.layout, h => h.bits())
    }

    /// Block height, carried by extended headers only.
    pub fn height(&self) -> Option<u32> {
        match &self.layout {
            HeaderLayout::Legacy(_) => None,
            HeaderLayout::Extended(h) => Some(h.height),
        }
    }

    /// Decoded proof-of-work target.
    pub fn target(&self) -> Target {
        with_header!(&self.layout, h => h.target())
    }

    /// Difficulty relative to the layout's genesis target.
    pub fn difficulty(&self) -> f64 {
        self.difficulty_with(&Params::MAINNET)
    }

    /// [`difficulty`](Self::difficulty) with the reference targets taken from
    /// `params`.
    pub fn difficulty_with(&self, params: &Params) -> f64 {
        with_header!(&self.layout, h => h.difficulty(params))
    }
}

impl PartialEq for BlockHeader {
    fn eq(&self, other: &Self) -> bool {
        self.layout == other.layout
    }
}

impl Eq for BlockHeader {}

impl Encodable for BlockHeader {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, IoError> {
        self.layout.consensus_encode(writer)
    }
}

impl Decodable for BlockHeader {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, EncodeDecodeError> {
        Self::decode_with(reader, &Params::MAINNET)
    }
}

impl fmt::Display for BlockHeader {
    /// Formats the serialized header as hex.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for BlockHeader {
    type Err = HeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<&[u8]> for BlockHeader {
    type Error = HeaderError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl TryFrom<HeaderLayout> for BlockHeader {
    type Error = HeaderError;

    fn try_from(layout: HeaderLayout) -> Result<Self, Self::Error> {
        Self::new(layout)
    }
}
