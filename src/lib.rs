/*!
Monte Carlo simulation of Bitcoin block propagation and mining strategy.

Estimates, for a given distribution of miner hashrates and per-miner block
propagation times, the long-run share of canonical chain blocks each miner
earns and each miner's stale rate. The propagation time is a simplification:
it is the time before which a block from a miner has reached no other miner
and after which it has reached all of them. Difficulty and network hashrate
are assumed constant.

Miners follow today's Bitcoin Core behaviour: mine on top of their own block
immediately, only switch to a propagated chain if it is longer, and break
ties between equal-length chains by first arrival. A miner can instead be
configured to run the worst case (gamma = 0) of the selfish mining strategy
from the 2013 "Majority is not Enough" paper
(https://arxiv.org/pdf/1311.0243).
*/

pub mod block;
pub mod miner;
pub mod prelude;
pub mod results;
pub mod rng;
pub mod sampling;
pub mod simulation;
