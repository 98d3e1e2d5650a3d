//! Standardized index series for one or several timescales.

use crate::error::{IndexError, Result};
use crate::rolling::rolling_sum;
use crate::series::{MonthlySeries, Period};
use crate::standardize::{IndexOptions, Standardized, standardize};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Compute the standardized index of a water-balance series.
///
/// The result has the periods of `water_balance` and is absent wherever the
/// rolling sum is undefined or no distribution could be fitted.
///
/// # Errors
/// Returns [`IndexError::InvalidParameter`] for a zero timescale, invalid
/// options, a malformed series or one with skipped months (see
/// [`MonthlySeries::with_missing_months`]). Per-position failures never
/// surface here.
pub fn compute_index(
    water_balance: &MonthlySeries,
    timescale: usize,
    options: &IndexOptions,
) -> Result<MonthlySeries> {
    let outcomes = compute_index_detailed(water_balance, timescale, options)?;
    let values = outcomes.iter().map(Standardized::value).collect();
    Ok(water_balance.with_values(values))
}

/// Like [`compute_index`], keeping the outcome of every position.
pub fn compute_index_detailed(
    water_balance: &MonthlySeries,
    timescale: usize,
    options: &IndexOptions,
) -> Result<Vec<Standardized>> {
    water_balance.validate()?;
    water_balance.check_contiguous()?;
    options.validate()?;

    let rolling = rolling_sum(water_balance.values(), timescale)?;
    standardize(&rolling, options)
}

/// Index values of one timescale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub timescale: usize,
    pub values: Vec<Option<f64>>,
}

impl IndexColumn {
    pub fn name(&self) -> String {
        format!("spei_{}", self.timescale)
    }
}

/// Index values of several timescales over the same periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexTable {
    pub periods: Vec<Period>,
    pub columns: Vec<IndexColumn>,
}

impl IndexTable {
    /// Compute one column per timescale, in parallel.
    ///
    /// Columns keep the order of `timescales`. Every timescale is validated
    /// before any of them is computed.
    pub fn compute(
        water_balance: &MonthlySeries,
        timescales: &[usize],
        options: &IndexOptions,
    ) -> Result<Self> {
        if timescales.is_empty() {
            return Err(IndexError::InvalidParameter(
                "at least one timescale is required".to_string(),
            ));
        }
        if timescales.contains(&0) {
            return Err(IndexError::InvalidParameter(
                "timescale must be positive".to_string(),
            ));
        }
        water_balance.validate()?;
        water_balance.check_contiguous()?;
        options.validate()?;

        let columns = timescales
            .par_iter()
            .map(|&timescale| {
                let index = compute_index(water_balance, timescale, options)?;
                log::debug!(
                    "timescale {timescale}: {} of {} values defined",
                    index.n_defined(),
                    index.len()
                );
                Ok(IndexColumn {
                    timescale,
                    values: index.values().to_vec(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            periods: water_balance.periods().to_vec(),
            columns,
        })
    }

    pub fn column(&self, timescale: usize) -> Option<&IndexColumn> {
        self.columns.iter().find(|col| col.timescale == timescale)
    }
}
