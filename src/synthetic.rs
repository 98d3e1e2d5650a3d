//! Reproducible synthetic climate tables.

use crate::config::SyntheticConfig;
use crate::series::{ClimateRecord, ClimateTable, Period};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Uniform;

/// Draw monthly precipitation and evapotranspiration totals uniformly.
pub fn generate_climate(station: &str, cfg: &SyntheticConfig, seed: u64) -> Result<ClimateTable> {
    let mut rng = ChaCha12Rng::seed_from_u64(seed);

    let [pr_low, pr_high] = cfg.precipitation;
    let [et_low, et_high] = cfg.evapotranspiration;
    let pr_dist =
        Uniform::new(pr_low, pr_high).context("invalid precipitation range")?;
    let et_dist =
        Uniform::new(et_low, et_high).context("invalid evapotranspiration range")?;

    let start = Period::new(cfg.start_year, 1).context("invalid start period")?;
    let records = std::iter::successors(Some(start), |period| Some(period.next()))
        .take(cfg.n_months)
        .map(|period| ClimateRecord {
            period,
            precipitation: Some(pr_dist.sample(&mut rng)),
            evapotranspiration: Some(et_dist.sample(&mut rng)),
        })
        .collect();

    Ok(ClimateTable {
        station: station.to_string(),
        records,
    })
}
