//! Configuring and validating a group of simulation runs.

use std::{collections::HashSet, time::Duration};

use crate::{
    block::{Millis, GENESIS_MINER_ID},
    miner::{Miner, MinerId},
};

use super::SimulationGroup;

/// Builds a [`SimulationGroup`].
#[derive(Debug, Default)]
pub struct SimulationBuilder {
    duration: Option<Duration>,
    runs: Option<usize>,
    miners: Vec<Miner>,
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationBuildError {
    #[error("no miners were added")]
    NoMinersGiven,
    #[error("no simulation duration was set")]
    NoDurationGiven,
    #[error("miner hashrate shares sum to {0}%, must be 100%")]
    BadHashrateSum(u64),
    #[error("duplicate miner id {0}")]
    DuplicateMinerId(MinerId),
    #[error("miner id {0} is reserved for the genesis block")]
    ReservedMinerId(MinerId),
    #[error("simulation duration must be greater than zero")]
    ZeroDuration,
    #[error("number of simulation runs must be greater than zero")]
    ZeroRuns,
}

impl SimulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `miner` to the simulated network. Miners are picked as block
    /// finders and scanned for the best chain in the order they are added.
    pub fn add_miner(mut self, miner: Miner) -> Self {
        self.miners.push(miner);
        self
    }

    /// Sets the timespan simulated by each run.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Sets the number of independent runs to aggregate (default 1).
    pub fn runs(mut self, runs: usize) -> Self {
        self.runs = Some(runs);
        self
    }

    /// Creates a [`SimulationGroup`] from the specified parameters.
    pub fn build(self) -> Result<SimulationGroup, SimulationBuildError> {
        use SimulationBuildError::*;

        let SimulationBuilder { duration, runs, miners } = self;

        if miners.is_empty() {
            return Err(NoMinersGiven);
        }

        let mut ids = HashSet::new();
        for miner in &miners {
            if miner.id() == GENESIS_MINER_ID {
                return Err(ReservedMinerId(miner.id()));
            }
            if !ids.insert(miner.id()) {
                return Err(DuplicateMinerId(miner.id()));
            }
        }

        let perc_sum: u64 = miners.iter().map(Miner::perc).sum();
        if perc_sum != 100 {
            return Err(BadHashrateSum(perc_sum));
        }

        let duration = match duration {
            None => return Err(NoDurationGiven),
            Some(d) if d.is_zero() => return Err(ZeroDuration),
            Some(d) => d.as_millis() as Millis,
        };
        let runs = match runs {
            Some(0) => return Err(ZeroRuns),
            Some(n) => n,
            None => 1,
        };

        Ok(SimulationGroup { duration, runs, miners })
    }
}
