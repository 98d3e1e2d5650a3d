//! Expanding-window standardization of rolling sums.

use crate::error::{IndexError, Result};
use crate::pearson3::{Estimator, Pearson3};
use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc_inv;
use std::f64::consts::SQRT_2;

/// Smallest probability passed to the inverse normal transform.
///
/// `1 - PROBABILITY_FLOOR` is the largest double below one, so the clamp is
/// symmetric and saturated indices stay finite (about +/- 8.2).
pub const PROBABILITY_FLOOR: f64 = f64::EPSILON / 2.0;

/// Settings shared by every position of a standardization run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Estimator used for every fit of the run.
    #[serde(default)]
    pub estimator: Estimator,
    /// Minimum number of rolling sums before a fit is attempted.
    #[serde(default = "default_min_sample")]
    pub min_sample: usize,
}

fn default_min_sample() -> usize {
    5
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            estimator: Estimator::default(),
            min_sample: default_min_sample(),
        }
    }
}

impl IndexOptions {
    pub fn validate(&self) -> Result<()> {
        if self.min_sample == 0 {
            return Err(IndexError::InvalidParameter(
                "minimum sample size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of the standardization at one position.
#[derive(Debug, Clone, PartialEq)]
pub enum Standardized {
    /// No rolling sum is defined at this position.
    NoAggregate,
    /// A rolling sum exists but no index could be derived from it.
    Rejected(IndexError),
    Value(f64),
}

impl Standardized {
    pub fn value(&self) -> Option<f64> {
        match self {
            Standardized::Value(val) => Some(*val),
            _ => None,
        }
    }
}

/// Standardize every defined rolling sum against its own history.
///
/// At each defined position the sample is every defined rolling sum up to
/// and including that position. The fit never sees later positions.
pub fn standardize(rolling: &[Option<f64>], options: &IndexOptions) -> Result<Vec<Standardized>> {
    options.validate()?;

    let mut sample = Vec::with_capacity(rolling.len());
    let outcomes = rolling
        .iter()
        .enumerate()
        .map(|(pos, &sum)| {
            let Some(sum) = sum else {
                return Standardized::NoAggregate;
            };
            sample.push(sum);

            match standardize_value(sum, &sample, options) {
                Ok(val) => Standardized::Value(val),
                Err(err) => {
                    match &err {
                        IndexError::FitNonConvergence(_) => {
                            log::warn!("position {pos}: {err}")
                        }
                        _ => log::debug!("position {pos}: {err}"),
                    }
                    Standardized::Rejected(err)
                }
            }
        })
        .collect();

    Ok(outcomes)
}

/// Standard normal score of `val` under a fit to `sample`.
pub fn standardize_value(val: f64, sample: &[f64], options: &IndexOptions) -> Result<f64> {
    if sample.len() < options.min_sample {
        return Err(IndexError::InsufficientData {
            needed: options.min_sample,
            got: sample.len(),
        });
    }
    check_spread(sample)?;

    let dist = Pearson3::fit(sample, options.estimator)?;
    let prob = dist.cdf(val);
    if prob.is_nan() {
        return Err(IndexError::FitNonConvergence(format!(
            "probability of {val} is not a number"
        )));
    }

    Ok(normal_quantile(prob))
}

/// Inverse standard normal CDF with saturation at the representable bounds.
pub fn normal_quantile(prob: f64) -> f64 {
    let prob = prob.clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR);
    -SQRT_2 * erfc_inv(2.0 * prob)
}

fn check_spread(sample: &[f64]) -> Result<()> {
    let (min, max) = sample
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &val| {
            (min.min(val), max.max(val))
        });
    let magnitude = min.abs().max(max.abs());
    if max - min <= 16.0 * f64::EPSILON * magnitude {
        return Err(IndexError::FitNonConvergence(format!(
            "sample of {} values has zero spread",
            sample.len()
        )));
    }
    Ok(())
}
