//! The per-miner chain and strategy state machine.
//!
//! A miner's local chain is both its mining head and the record of every
//! block it ever held. A single ordered sequence represents published,
//! in-flight and withheld blocks uniformly: a block whose arrival is in the
//! future is still propagating, and a block whose arrival is
//! [`PRIVATE_ARRIVAL`] is withheld by a selfish miner. Withheld blocks are
//! always a contiguous suffix.

use std::time::Duration;

use crate::block::{Block, Millis, PRIVATE_ARRIVAL};

/// Numeric type of each miner's unique identifier.
pub type MinerId = u32;

/// A miner with a local chain, following either the honest strategy or the
/// worst case (gamma = 0) selfish mining strategy from section 3.2 of
/// "Majority is not Enough" (https://arxiv.org/pdf/1311.0243).
#[derive(Debug, Clone)]
pub struct Miner {
    id: MinerId,
    /// Share of the total network hashrate, as an integer between 0 and 100.
    perc: u64,
    /// Time for a block produced by this miner to reach all other miners.
    propagation: Millis,
    /// Local chain on the miner's full node. May differ slightly between
    /// miners due to propagation times.
    chain: Vec<Block>,
    /// Number of blocks this miner created that were reorged out.
    stale_blocks: u64,
    is_selfish: bool,
}

impl Miner {
    /// Creates an honest miner with the given hashrate share (an integer
    /// percentage) and block propagation time.
    pub fn new(id: MinerId, perc: u64, propagation: Duration) -> Self {
        Miner {
            id,
            perc,
            propagation: propagation.as_millis() as Millis,
            chain: vec![Block::genesis()],
            stale_blocks: 0,
            is_selfish: false,
        }
    }

    /// Creates a miner following the selfish mining strategy.
    pub fn new_selfish(id: MinerId, perc: u64, propagation: Duration) -> Self {
        Miner { is_selfish: true, ..Self::new(id, perc, propagation) }
    }

    #[inline]
    pub fn id(&self) -> MinerId {
        self.id
    }

    #[inline]
    pub fn perc(&self) -> u64 {
        self.perc
    }

    #[inline]
    pub fn is_selfish(&self) -> bool {
        self.is_selfish
    }

    #[inline]
    pub fn stale_blocks(&self) -> u64 {
        self.stale_blocks
    }

    /// Absolute time at which a block created by this miner at `time` has
    /// reached every other miner.
    #[inline]
    fn propagated(&self, time: Millis) -> Millis {
        debug_assert!(time < PRIVATE_ARRIVAL - self.propagation);
        time + self.propagation
    }

    /// Records a block found by this miner at the given absolute time.
    ///
    /// An honest miner starts broadcasting right away. A selfish miner keeps
    /// mining on top of its private chain instead, except that winning a
    /// 1-block race (exactly one withheld block while the published network
    /// chain has caught up to our total length) publishes both the withheld
    /// block and the new one at once.
    pub fn found_block(&mut self, block_time: Millis, best_chain_size: usize) {
        if self.is_selfish {
            let race = self.selfish_blocks() == 1
                && best_chain_size == self.chain.len();
            if race {
                let arrival = self.propagated(block_time);
                let last = self.chain.len() - 1;
                self.chain[last].arrival = arrival;
                self.chain.push(Block::new(self.id, arrival));
            } else {
                self.chain.push(Block::new(self.id, PRIVATE_ARRIVAL));
            }
        } else {
            self.chain.push(Block::new(self.id, self.propagated(block_time)));
        }
    }

    /// Number of blocks in this miner's chain that have not reached the rest
    /// of the network by `cur_time`, withheld ones included.
    pub fn unpublished_blocks(&self, cur_time: Millis) -> usize {
        // Arrivals are monotonic below the withheld suffix, so stop at the
        // first block everyone has seen.
        self.chain.iter().rev().take_while(|b| b.arrival > cur_time).count()
    }

    /// Length of a selfish miner's withheld branch. Always zero for an
    /// honest miner.
    pub fn selfish_blocks(&self) -> usize {
        self.chain
            .iter()
            .rev()
            .take_while(|b| b.arrival == PRIVATE_ARRIVAL)
            .count()
    }

    /// This miner's chain, truncated to the blocks the whole network has
    /// received by `cur_time`.
    pub fn published_chain(&self, cur_time: Millis) -> &[Block] {
        &self.chain[..self.chain.len() - self.unpublished_blocks(cur_time)]
    }

    /// Earliest in-flight arrival strictly after `cur_time`, ignoring
    /// withheld blocks: the next time this miner makes a block visible to
    /// the rest of the network.
    pub(crate) fn next_arrival_after(&self, cur_time: Millis) -> Option<Millis> {
        self.chain
            .iter()
            .rev()
            .take_while(|b| b.arrival > cur_time)
            .filter(|b| b.arrival < PRIVATE_ARRIVAL)
            .map(|b| b.arrival)
            .min()
    }

    /// Number of this miner's own blocks that the whole network has received
    /// by `cur_time`.
    pub fn blocks_found(&self, cur_time: Millis) -> usize {
        self.chain
            .iter()
            .filter(|b| b.miner_id == self.id && b.arrival <= cur_time)
            .count()
    }

    /// Lets this miner know about the longest published chain across the
    /// network. A selfish miner may react by revealing some of its withheld
    /// blocks, and any miner switches to the published chain if it is longer
    /// than its own.
    pub fn notify_best_chain(&mut self, best_chain: &[Block], cur_time: Millis) {
        self.maybe_selfish_reveal(best_chain, cur_time);
        self.maybe_reorg(best_chain);
    }

    /// Selectively reveals withheld blocks as the rest of the network
    /// catches up, per the gamma = 0 strategy: reveal as many blocks as the
    /// others have just found, except that a lead melting down to a single
    /// block publishes the whole withheld branch at once, since a 1-block
    /// race against the entire network is lost at gamma = 0.
    fn maybe_selfish_reveal(&mut self, best_chain: &[Block], cur_time: Millis) {
        if !self.is_selfish {
            return;
        }

        // Their chain is longer: we have to switch, and the reorg below
        // overwrites the withheld blocks.
        if best_chain.len() > self.chain.len() {
            return;
        }

        let selfish_count = self.selfish_blocks();
        let current_lead = self.chain.len() - best_chain.len();
        if selfish_count > current_lead {
            let mut reveal_count = selfish_count - current_lead;
            if selfish_count > 1 && current_lead == 1 {
                reveal_count = selfish_count;
            }

            // Broadcast the oldest withheld blocks by giving them an actual
            // arrival time, keeping arrivals monotonic below the suffix.
            let arrival = self.propagated(cur_time);
            let start = self.chain.len() - selfish_count;
            for block in &mut self.chain[start..start + reveal_count] {
                block.arrival = arrival;
            }
        }
    }

    /// Switches to the given published chain if it is longer than our own,
    /// counting every own block overwritten in the process as stale.
    ///
    /// Only the last few blocks ever differ, so entries are overwritten in
    /// place rather than wiping and refilling the whole vector.
    fn maybe_reorg(&mut self, best_chain: &[Block]) {
        if best_chain.len() <= self.chain.len() {
            return;
        }

        for (i, &block) in best_chain.iter().enumerate() {
            if i >= self.chain.len() {
                self.chain.push(block);
            } else if self.chain[i] != block {
                if self.chain[i].miner_id == self.id {
                    self.stale_blocks += 1;
                }
                self.chain[i] = block;
            }
            // Same block at the same height: nothing to do.
        }
    }
}
