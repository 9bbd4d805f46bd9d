//! End-to-end plate planning: source grid → pools → destination wells → transfers.
//!
//! [`plan_many`] plans several plates at once on a local Rayon pool. Each
//! plate builds its own generator and covered set, so results depend only on
//! the configuration and the seed, never on scheduling.
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::assign::assign;
use crate::error::{PlateError, Result};
use crate::pool::{partition, PrimerPools, DEFAULT_OFFSET};
use crate::transfer::TransferRecord;
use crate::well::{well_grid, PlateFormat};

/// Default Echo transfer volume in nL.
pub const DEFAULT_VOLUME_NL: f64 = 500.0;

/// Everything needed to plan one plate.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanConfig {
    /// Format of the primer source plate.
    pub source: PlateFormat,
    /// Format of the destination plate; every well receives one pair.
    pub destination: PlateFormat,
    /// Leading primers of each pool reserved for controls.
    pub offset: usize,
    /// Volume per transfer, nL.
    pub volume: f64,
    pub seed: u64,
    /// Seed the generator from `seed`; otherwise use OS entropy.
    pub deterministic: bool,
}

impl Default for PlanConfig {
    fn default() -> Self {
        PlanConfig {
            source: PlateFormat::Wells384,
            destination: PlateFormat::Wells384,
            offset: DEFAULT_OFFSET,
            volume: DEFAULT_VOLUME_NL,
            seed: 0,
            deterministic: true,
        }
    }
}

impl PlanConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.volume.is_finite() && self.volume > 0.0) {
            return Err(PlateError::config(format!("transfer volume must be positive, got {}", self.volume)));
        }
        Ok(())
    }

    /// The active pools this configuration draws from.
    pub fn pools(&self) -> Result<PrimerPools> {
        partition(&well_grid(self.source), self.offset)
    }
}

/// Plan one plate.
pub fn plan_plate(config: &PlanConfig) -> Result<Vec<TransferRecord>> {
    config.validate()?;
    let pools = config.pools()?;
    let cells = config.destination.wells();
    log::info!(
        "planning {}-well plate from {}x{} primers (seed {}, deterministic {})",
        config.destination,
        pools.forward.len(),
        pools.reverse.len(),
        config.seed,
        config.deterministic
    );
    assign(&pools, &cells, config.volume, config.seed, config.deterministic)
}

/// Plan one plate per seed in parallel, returned in seed order.
///
/// `threads = None` uses all logical cores.
pub fn plan_many(config: &PlanConfig, seeds: &[u64], threads: Option<usize>) -> Result<Vec<(u64, Vec<TransferRecord>)>> {
    config.validate()?;
    let n = threads.unwrap_or_else(num_cpus::get).max(1);
    let pool = ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .map_err(|e| PlateError::config(format!("cannot build thread pool: {e}")))?;
    pool.install(|| {
        seeds
            .par_iter()
            .map(|&seed| {
                let cfg = PlanConfig { seed, ..config.clone() };
                plan_plate(&cfg).map(|records| (seed, records))
            })
            .collect()
    })
}
