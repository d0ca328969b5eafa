pub use bitcoin::hashes::Hash;
pub use bitcoin::{BlockHash, TxMerkleNode};
