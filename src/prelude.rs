/*!
Re-export of common values and datatypes used for configuring and running
simulations. Must be imported manually.

```
use propagation_sim::prelude::*;
```
*/

use crate::{block, miner, results, rng, sampling, simulation};

pub use block::{Block, Millis, GENESIS_MINER_ID, PRIVATE_ARRIVAL};

pub use miner::{Miner, MinerId};

pub use results::{
    ideal_selfish_revenue, Format, MinerAverage, MinerRunStats, RunStats,
    SimulationResults,
};

pub use rng::Rng;

pub use sampling::{next_block_interval, pick_finder, BLOCK_INTERVAL_MS};

pub use simulation::{SimulationBuildError, SimulationBuilder, SimulationGroup};
