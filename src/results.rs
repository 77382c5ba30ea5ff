//! Per-run statistics and their aggregation into the final report.

use std::fmt::{self, Display};

use crate::{
    block::{Block, Millis},
    miner::{Miner, MinerId},
};

/// Floating point precision of CSV results data.
const FLOAT_PRECISION_DIGITS: usize = 6;

/// Counters for a single miner over one finished run.
#[derive(Debug, Clone, Copy)]
pub struct MinerRunStats {
    /// Blocks of this miner on the final canonical chain.
    pub blocks_found: u64,
    /// Fraction of the canonical chain (genesis excluded) found by this
    /// miner. Zero if it found nothing.
    pub blocks_share: f64,
    /// Stale blocks per block found by this miner. Zero if it found nothing.
    pub stale_rate: f64,
}

/// Per-miner counters of one finished run, in miner order.
#[derive(Debug, Clone)]
pub struct RunStats(Vec<MinerRunStats>);

impl RunStats {
    /// Reduces a finished run to per-miner counters, given the canonical
    /// chain the network settled on.
    pub(crate) fn reduce(best_chain: &[Block], miners: &[Miner]) -> Self {
        let canonical = best_chain.len().saturating_sub(1); // minus genesis
        let stats = miners
            .iter()
            .map(|miner| {
                let blocks_found = best_chain
                    .iter()
                    .filter(|b| b.miner_id == miner.id())
                    .count() as u64;

                // Finding no blocks at all is a legitimate outcome for a
                // short run, reported as zeroed rates.
                let (blocks_share, stale_rate) = if blocks_found > 0 {
                    (
                        blocks_found as f64 / canonical as f64,
                        miner.stale_blocks() as f64 / blocks_found as f64,
                    )
                } else {
                    (0.0, 0.0)
                };

                MinerRunStats { blocks_found, blocks_share, stale_rate }
            })
            .collect();

        RunStats(stats)
    }

    pub fn stats(&self) -> &[MinerRunStats] {
        &self.0
    }
}

/// Describes the appearance of [`SimulationResults`] as given by its
/// [`Display`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Human-readable report, one line per miner.
    #[default]
    PrettyPrint,
    /// Comma-separated values, suitable for plotting scripts.
    Csv,
}

/// Running per-miner sums across runs, divided by the run count on display.
#[derive(Debug, Clone)]
struct MinerTotals {
    id: MinerId,
    perc: u64,
    is_selfish: bool,
    blocks_found: f64,
    blocks_share: f64,
    stale_rate: f64,
}

/// Aggregated statistics over a group of runs. The report is given by the
/// struct's [`Display`] implementation, as specified by its [`Format`].
#[derive(Debug, Clone)]
pub struct SimulationResults {
    runs: usize,
    duration: Millis,
    format: Format,
    totals: Vec<MinerTotals>,
}

/// Averaged statistics for one miner, across all runs.
#[derive(Debug, Clone, Copy)]
pub struct MinerAverage {
    pub id: MinerId,
    pub perc: u64,
    pub is_selfish: bool,
    pub blocks_found: f64,
    pub blocks_share: f64,
    pub stale_rate: f64,
}

impl SimulationResults {
    pub(crate) fn new(miners: &[Miner], duration: Millis) -> Self {
        let totals = miners
            .iter()
            .map(|miner| MinerTotals {
                id: miner.id(),
                perc: miner.perc(),
                is_selfish: miner.is_selfish(),
                blocks_found: 0.0,
                blocks_share: 0.0,
                stale_rate: 0.0,
            })
            .collect();

        SimulationResults { runs: 0, duration, format: Format::default(), totals }
    }

    /// Folds one finished run into the totals. Addition is associative, so
    /// the order runs are folded in does not matter.
    pub(crate) fn fold(&mut self, run: RunStats) {
        assert_eq!(run.stats().len(), self.totals.len());

        for (totals, stats) in self.totals.iter_mut().zip(run.stats()) {
            totals.blocks_found += stats.blocks_found as f64;
            totals.blocks_share += stats.blocks_share;
            totals.stale_rate += stats.stale_rate;
        }
        self.runs += 1;
    }

    /// Number of runs aggregated so far.
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Simulated timespan of each run, in milliseconds.
    pub fn duration_ms(&self) -> Millis {
        self.duration
    }

    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Averaged statistics per miner, in miner order.
    pub fn averages(&self) -> Vec<MinerAverage> {
        debug_assert!(self.runs > 0, "averaging zero runs");

        let runs = self.runs as f64;
        self.totals
            .iter()
            .map(|t| MinerAverage {
                id: t.id,
                perc: t.perc,
                is_selfish: t.is_selfish,
                blocks_found: t.blocks_found / runs,
                blocks_share: t.blocks_share / runs,
                stale_rate: t.stale_rate / runs,
            })
            .collect()
    }
}

impl Display for SimulationResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            Format::PrettyPrint => {
                writeln!(
                    f,
                    "Average of {} runs of {} each:",
                    self.runs,
                    format_duration(self.duration)
                )?;
                for avg in self.averages() {
                    write!(
                        f,
                        "  - Miner {} ({}% of network hashrate) found {:.1} \
                         blocks i.e. {:.2}% of blocks. Stale rate: {:.2}%.",
                        avg.id,
                        avg.perc,
                        avg.blocks_found,
                        avg.blocks_share * 100.0,
                        avg.stale_rate * 100.0,
                    )?;
                    if avg.is_selfish {
                        write!(f, " ('selfish mining' strategy)")?;
                    }
                    writeln!(f)?;
                }
            }
            Format::Csv => {
                writeln!(
                    f,
                    "miner_id,hashrate_perc,avg_blocks_found,avg_blocks_share,\
                     avg_stale_rate,selfish"
                )?;
                for avg in self.averages() {
                    writeln!(
                        f,
                        "{id},{perc},{found:.prec$},{share:.prec$},{stale:.prec$},{selfish}",
                        id = avg.id,
                        perc = avg.perc,
                        found = avg.blocks_found,
                        share = avg.blocks_share,
                        stale = avg.stale_rate,
                        selfish = avg.is_selfish,
                        prec = FLOAT_PRECISION_DIGITS,
                    )?;
                }
            }
        }

        Ok(())
    }
}

/// Closed-form expected share of canonical blocks for a selfish miner with
/// hashrate fraction `alpha`, in the worst case where no honest miner ever
/// builds on the selfish pool's block in a race (equation 8 of the selfish
/// mining paper with gamma = 0). Exceeds `alpha` for `alpha > 1/3`.
pub fn ideal_selfish_revenue(alpha: f64) -> f64 {
    (4.0 * alpha.powi(2) * (1.0 - alpha).powi(2) - alpha.powi(3))
        / (1.0 - alpha * (1.0 + (2.0 - alpha) * alpha))
}

fn format_duration(ms: Millis) -> String {
    const HOUR: Millis = 3_600_000;
    const DAY: Millis = 24 * HOUR;

    if ms >= DAY && ms % DAY == 0 {
        format!("{} days", ms / DAY)
    } else if ms >= HOUR && ms % HOUR == 0 {
        format!("{} hours", ms / HOUR)
    } else {
        format!("{}ms", ms)
    }
}
