//! Sampling the mining process: block intervals and block finders.

use crate::{block::Millis, miner::Miner, rng::Rng};

/// Expected time between two consecutive blocks, the mean of the exponential
/// distribution intervals are drawn from.
pub const BLOCK_INTERVAL_MS: Millis = 600_000;

/// Maps integer percentages in `[0, 100]` onto `[0, u64::MAX]`.
const PERC_MULTIPLIER: u64 = u64::MAX / 100;

/// Draws the time between the last and the next block, rounded to the
/// millisecond.
pub fn next_block_interval(rng: &mut Rng) -> Millis {
    let interval = rng.exporand(BLOCK_INTERVAL_MS as f64);
    debug_assert!(interval >= 0.0);
    interval.round() as Millis
}

/// Picks which miner found a block, with probability proportional to its
/// hashrate share, by walking the miners in order and accumulating
/// `perc * PERC_MULTIPLIER` against a uniform 64-bit draw. The comparison
/// with the draw is strict: the accumulator must exceed it for the walk to
/// stop.
///
/// # Panics
///
/// Panics if the miners' hashrate shares do not sum to 100.
pub fn pick_finder<'a>(miners: &'a mut [Miner], rng: &mut Rng) -> &'a mut Miner {
    let random = rng.rand64();
    let mut acc: u64 = 0;
    for miner in miners.iter_mut() {
        acc += miner.perc() * PERC_MULTIPLIER;
        if acc > random {
            return miner;
        }
    }
    panic!("the miners' hashrate shares must add up to 100");
}
