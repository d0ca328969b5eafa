mod params;

pub use bitcoin::consensus::encode::{
    Decodable, Encodable, Error as EncodeDecodeError, VarInt, serialize,
};
pub use params::{
    EXTENDED_GENESIS_BITS, LEGACY_GENESIS_BITS, LOCKTIME_THRESHOLD, MAX_TIME_OFFSET, Params,
    START_OF_HEADER,
};
