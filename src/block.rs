//! Definitions for blocks

use crate::miner::MinerId;

/// Simulation time, in milliseconds since the start of the run.
pub type Millis = u64;

/// Miner id carried by the genesis block, which no simulated miner created.
pub const GENESIS_MINER_ID: MinerId = MinerId::MAX;

/// Arrival time of a block a selfish miner is withholding. Such a block sits
/// at the tail of its owner's chain and is never reported as published for
/// any real clock value.
pub const PRIVATE_ARRIVAL: Millis = Millis::MAX;

/// A mined block as recorded in a miner's local chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Which miner created this block.
    pub miner_id: MinerId,
    /// At what point all other miners will have received this block.
    pub arrival: Millis,
}

impl Block {
    pub fn new(miner_id: MinerId, arrival: Millis) -> Self {
        Block { miner_id, arrival }
    }

    /// The genesis block, not created by any miner and received by everyone
    /// at time zero.
    pub fn genesis() -> Self {
        Block { miner_id: GENESIS_MINER_ID, arrival: 0 }
    }
}
