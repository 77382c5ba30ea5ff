//! Nine honest miners with today's rough pool hashrate distribution and a
//! pessimistic propagation time, to measure how slow propagation hurts the
//! smallest miners.

use std::time::{Duration, Instant};

use anyhow::Result;
use log::info;
use simple_logger::SimpleLogger;

use propagation_sim::prelude::*;

/// Number of independent simulation runs to aggregate.
const SIM_RUNS: usize = 512;
/// Timespan simulated by each run.
const SIM_DURATION: Duration = Duration::from_secs(365 * 24 * 3600);
/// Time for any miner's blocks to reach the whole network.
const PROPAGATION: Duration = Duration::from_secs(10);

/// Hashrate share of each miner, in percent.
const SHARES: [u64; 9] = [30, 29, 12, 11, 8, 5, 3, 1, 1];

fn main() -> Result<()> {
    SimpleLogger::new().init()?;
    let start = Instant::now();

    let mut builder = SimulationBuilder::new();
    for (id, &perc) in SHARES.iter().enumerate() {
        builder = builder.add_miner(Miner::new(id as MinerId, perc, PROPAGATION));
    }
    let group = builder.duration(SIM_DURATION).runs(SIM_RUNS).build()?;

    let results = group.run_all();
    println!("{}", results);

    info!("elapsed time: {:.2} secs", start.elapsed().as_secs_f64());
    Ok(())
}
