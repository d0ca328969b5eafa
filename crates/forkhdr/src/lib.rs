//! Block header codec for a Bitcoin-family chain that forked its header format.
//!
//! Headers come in two wire layouts, the original 80-byte legacy layout and a
//! longer extended layout introduced at the fork. This library tells them apart
//! from the bytes alone, decodes and re-encodes either, computes block ids,
//! proof-of-work targets and difficulty, and runs the standalone timestamp and
//! proof-of-work checks.

#![cfg_attr(test, allow(clippy::arithmetic_side_effects))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::cast_sign_loss))]
#![cfg_attr(test, allow(clippy::indexing_slicing))]
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::cast_possible_truncation))]

/// Block header data structures.
pub mod blockdata;
/// Consensus encoding and decoding functionality, and network parameters.
pub mod consensus;
/// Hash functions and types used in headers.
pub mod hashes;
/// I/O utilities for reading and writing data.
pub mod io;
/// Proof of Work related functionality.
pub mod pow;
/// Utility functions and types.
pub mod util;

pub use blockdata::{
    block::{
        BlockHeader, ExtendedHeader, Header, HeaderError, HeaderFields, HeaderLayout,
        LegacyHeader, NonceField, Reserved, ValidationError, is_extended, is_extended_with,
    },
    genesis::GenesisInfo,
};
pub use consensus::Params;
pub use pow::{CompactTarget, LARGEST_HASH, Target};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
