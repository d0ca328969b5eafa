//! Plain field mapping of a header, and its JSON form.
//!
//! Hashes, the reserved bytes and the extended nonce appear as hex in display
//! (byte-reversed) order. The solution is hex in wire order.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    blockdata::block::{
        BlockHeader, ExtendedHeader, HeaderError, HeaderLayout, LegacyHeader, Reserved,
        header::is_extended_with,
    },
    consensus::Params,
    hashes::{BlockHash, TxMerkleNode},
    pow::CompactTarget,
    util::{reversed_array_from_hex, to_reversed_hex},
};

/// A header's fields as plain values.
///
/// `height`, `reserved` and `solution` are only present for extended headers,
/// whose `nonce` is hex rather than a number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFields {
    /// Block id. Checked against the other fields when building a header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Block version.
    pub version: i32,
    /// Hash of the previous block, display-order hex.
    pub prev_hash: String,
    /// Merkle root of the block's transactions, display-order hex.
    pub merkle_root: String,
    /// Block height. Absent or zero selects the legacy layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// The 28 reserved bytes, display-order hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved: Option<String>,
    /// The timestamp of the block, as claimed by the miner.
    pub time: u32,
    /// Compact proof-of-work target.
    pub bits: u32,
    /// The nonce, numeric for legacy headers and hex for extended ones.
    pub nonce: NonceField,
    /// The proof-of-work solution, hex in wire order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
}

/// The nonce of either layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NonceField {
    /// Legacy 32-bit nonce.
    Number(u32),
    /// Extended 256-bit nonce, display-order hex.
    Hex(String),
}

fn invalid(field: &'static str, reason: impl fmt::Display) -> HeaderError {
    HeaderError::InvalidField {
        field,
        reason: reason.to_string(),
    }
}

fn parse_hash<T>(field: &'static str, hex: &str) -> Result<T, HeaderError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    T::from_str(hex).map_err(|e| invalid(field, e))
}

impl BlockHeader {
    /// Builds a header from plain fields. The layout is extended when
    /// [`is_extended`](crate::is_extended) accepts `height`, legacy otherwise
    /// (including when `height` is absent).
    ///
    /// # Errors
    ///
    /// * `HeaderError::MissingField` - If an extended field is absent
    /// * `HeaderError::InvalidField` - If a field is malformed or the nonce
    ///   kind does not match the layout
    /// * `HeaderError::HashMismatch` - If `hash` is given and differs from the
    ///   computed id
    /// * `HeaderError::InconsistentLayout` - If a legacy `time` falls in the
    ///   height range
    pub fn from_fields(fields: HeaderFields) -> Result<Self, HeaderError> {
        Self::from_fields_with(fields, &Params::MAINNET)
    }

    /// [`from_fields`](Self::from_fields) with the detector threshold taken from
    /// `params`.
    pub fn from_fields_with(fields: HeaderFields, params: &Params) -> Result<Self, HeaderError> {
        let prev_blockhash: BlockHash = parse_hash("prevHash", &fields.prev_hash)?;
        let merkle_root: TxMerkleNode = parse_hash("merkleRoot", &fields.merkle_root)?;
        let bits = CompactTarget::from_consensus(fields.bits);
        let height = fields.height.unwrap_or(0);

        let layout = if is_extended_with(height, params) {
            let reserved = fields
                .reserved
                .as_deref()
                .ok_or(HeaderError::MissingField("reserved"))?;
            let reserved =
                Reserved(reversed_array_from_hex(reserved).map_err(|e| invalid("reserved", e))?);
            let nonce = match &fields.nonce {
                NonceField::Hex(hex) => {
                    reversed_array_from_hex(hex).map_err(|e| invalid("nonce", e))?
                }
                NonceField::Number(_) => {
                    return Err(invalid("nonce", "extended headers carry a 32-byte hex nonce"));
                }
            };
            let solution = fields
                .solution
                .as_deref()
                .ok_or(HeaderError::MissingField("solution"))?;
            let solution = hex::decode(solution).map_err(|e| invalid("solution", e))?;

            HeaderLayout::Extended(ExtendedHeader {
                version: fields.version,
                prev_blockhash,
                merkle_root,
                height,
                reserved,
                time: fields.time,
                bits,
                nonce,
                solution,
            })
        } else {
            let nonce = match &fields.nonce {
                NonceField::Number(nonce) => *nonce,
                NonceField::Hex(_) => {
                    return Err(invalid("nonce", "legacy headers carry a numeric nonce"));
                }
            };

            HeaderLayout::Legacy(LegacyHeader {
                version: fields.version,
                prev_blockhash,
                merkle_root,
                time: fields.time,
                bits,
                nonce,
            })
        };

        let header = BlockHeader::new_with(layout, params)?;
        if let Some(hash) = fields.hash.as_deref() {
            header.check_hash(parse_hash("hash", hash)?)?;
        }
        Ok(header)
    }

    /// Renders the header as plain fields, including its id.
    pub fn to_fields(&self) -> HeaderFields {
        let hash = Some(self.id().to_string());
        match &self.layout {
            HeaderLayout::Legacy(h) => HeaderFields {
                hash,
                version: h.version,
                prev_hash: h.prev_blockhash.to_string(),
                merkle_root: h.merkle_root.to_string(),
                height: None,
                reserved: None,
                time: h.time,
                bits: h.bits.to_consensus(),
                nonce: NonceField::Number(h.nonce),
                solution: None,
            },
            HeaderLayout::Extended(h) => HeaderFields {
                hash,
                version: h.version,
                prev_hash: h.prev_blockhash.to_string(),
                merkle_root: h.merkle_root.to_string(),
                height: Some(h.height),
                reserved: Some(h.reserved.to_string()),
                time: h.time,
                bits: h.bits.to_consensus(),
                nonce: NonceField::Hex(to_reversed_hex(&h.nonce)),
                solution: Some(hex::encode(&h.solution)),
            },
        }
    }

    /// Builds a header from JSON: a string is read as header hex, an object
    /// as a field mapping.
    pub fn from_json(json: &str) -> Result<Self, HeaderError> {
        let value: Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Renders [`to_fields`](Self::to_fields) as a JSON object.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_fields())
    }
}

impl TryFrom<HeaderFields> for BlockHeader {
    type Error = HeaderError;

    fn try_from(fields: HeaderFields) -> Result<Self, Self::Error> {
        Self::from_fields(fields)
    }
}

impl TryFrom<Value> for BlockHeader {
    type Error = HeaderError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(hex) => Self::from_hex(&hex),
            Value::Object(_) => Self::from_fields(serde_json::from_value(value)?),
            Value::Null => Err(HeaderError::UnrecognizedInput("null")),
            Value::Bool(_) => Err(HeaderError::UnrecognizedInput("boolean")),
            Value::Number(_) => Err(HeaderError::UnrecognizedInput("number")),
            Value::Array(_) => Err(HeaderError::UnrecognizedInput("array")),
        }
    }
}

impl From<&BlockHeader> for HeaderFields {
    fn from(header: &BlockHeader) -> Self {
        header.to_fields()
    }
}

impl From<BlockHeader> for HeaderFields {
    fn from(header: BlockHeader) -> Self {
        header.to_fields()
    }
}
