//! Five miners, the biggest of which runs the selfish mining strategy.

use std::time::{Duration, Instant};

use anyhow::Result;
use log::info;
use simple_logger::SimpleLogger;

use propagation_sim::prelude::*;

/// Number of independent simulation runs to aggregate.
const SIM_RUNS: usize = 1024;
/// Timespan simulated by each run.
const SIM_DURATION: Duration = Duration::from_secs(365 * 24 * 3600);
/// Time for any miner's blocks to reach the whole network.
const PROPAGATION: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    SimpleLogger::new().init()?;
    let start = Instant::now();

    let group = SimulationBuilder::new()
        .add_miner(Miner::new(0, 10, PROPAGATION))
        .add_miner(Miner::new(1, 15, PROPAGATION))
        .add_miner(Miner::new(2, 15, PROPAGATION))
        .add_miner(Miner::new(3, 20, PROPAGATION))
        .add_miner(Miner::new_selfish(4, 40, PROPAGATION))
        .duration(SIM_DURATION)
        .runs(SIM_RUNS)
        .build()?;

    let results = group.run_all();
    println!("{}", results);
    println!(
        "Closed-form selfish revenue at 40% hashrate (zero propagation): {:.2}%",
        ideal_selfish_revenue(0.40) * 100.0
    );

    info!("elapsed time: {:.2} secs", start.elapsed().as_secs_f64());
    Ok(())
}
