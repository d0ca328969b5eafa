/// Block header data structures and codec.
pub mod block;

/// Genesis header of the pre-fork chain.
pub mod genesis;
