//! Run configuration read from `config.toml`.

use crate::pearson3::Estimator;
use crate::standardize::IndexOptions;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Run configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub index: IndexConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub synthetic: SyntheticConfig,
}

/// Index computation parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Aggregation timescales in months.
    pub timescales: Vec<usize>,

    /// Distribution fitting procedure.
    #[serde(default)]
    pub estimator: Estimator,

    /// Minimum number of rolling sums before fitting.
    #[serde(default = "default_min_sample")]
    pub min_sample: usize,
}

fn default_min_sample() -> usize {
    IndexOptions::default().min_sample
}

impl IndexConfig {
    pub fn options(&self) -> IndexOptions {
        IndexOptions {
            estimator: self.estimator,
            min_sample: self.min_sample,
        }
    }
}

/// Summary parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Index values at or below this are dry.
    pub dry_threshold: f64,
    /// Index values at or above this are wet.
    pub wet_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dry_threshold: -1.0,
            wet_threshold: 1.0,
        }
    }
}

/// Synthetic climate parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// Year of the first (January) record.
    pub start_year: i32,
    /// Number of monthly records.
    pub n_months: usize,
    /// Range of monthly precipitation totals (mm).
    pub precipitation: [f64; 2],
    /// Range of monthly evapotranspiration totals (mm).
    pub evapotranspiration: [f64; 2],
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            start_year: 1980,
            n_months: 240,
            precipitation: [30.0, 120.0],
            evapotranspiration: [20.0, 100.0],
        }
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let index = &self.index;
        check_num(index.timescales.len(), 1..=16).context("invalid number of timescales")?;
        for &timescale in &index.timescales {
            check_num(timescale, 1..=120).context("invalid timescale")?;
        }
        let mut sorted = index.timescales.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != index.timescales.len() {
            bail!("timescales must be distinct");
        }
        check_num(index.min_sample, 1..=1000).context("invalid minimum sample size")?;

        let analysis = &self.analysis;
        check_num(analysis.dry_threshold, -10.0..=0.0).context("invalid dry threshold")?;
        check_num(analysis.wet_threshold, 0.0..=10.0).context("invalid wet threshold")?;
        if analysis.dry_threshold >= analysis.wet_threshold {
            bail!("dry threshold must be below the wet threshold");
        }

        let synthetic = &self.synthetic;
        check_num(synthetic.start_year, 1..=9999).context("invalid start year")?;
        check_num(synthetic.n_months, 1..=12_000).context("invalid number of months")?;
        check_range(synthetic.precipitation).context("invalid precipitation range")?;
        check_range(synthetic.evapotranspiration)
            .context("invalid evapotranspiration range")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_range(range: [f64; 2]) -> Result<()> {
    let [low, high] = range;
    check_num(low, 0.0..10_000.0).context("invalid lower bound")?;
    check_num(high, 0.0..10_000.0).context("invalid upper bound")?;
    if low >= high {
        bail!("lower bound must be below the upper bound, but {low} >= {high}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = Config::from_toml("[index]\ntimescales = [3, 6, 12]\n").unwrap();
        assert_eq!(cfg.index.timescales, vec![3, 6, 12]);
        assert_eq!(cfg.index.estimator, Estimator::MethodOfMoments);
        assert_eq!(cfg.index.options(), IndexOptions::default());
        assert_eq!(cfg.analysis, AnalysisConfig::default());
        assert_eq!(cfg.synthetic, SyntheticConfig::default());
    }

    #[test]
    fn full_config_is_parsed() {
        let contents = String::new()
            + "[index]\n"
            + "timescales = [1, 24]\n"
            + "estimator = \"maximum-likelihood\"\n"
            + "min_sample = 12\n"
            + "\n"
            + "[analysis]\n"
            + "dry_threshold = -1.5\n"
            + "wet_threshold = 1.5\n"
            + "\n"
            + "[synthetic]\n"
            + "start_year = 1991\n"
            + "n_months = 36\n"
            + "precipitation = [0.0, 200.0]\n"
            + "evapotranspiration = [10.0, 150.0]\n";
        let cfg = Config::from_toml(&contents).unwrap();
        assert_eq!(cfg.index.estimator, Estimator::MaximumLikelihood);
        assert_eq!(cfg.index.min_sample, 12);
        assert_eq!(cfg.analysis.dry_threshold, -1.5);
        assert_eq!(cfg.synthetic.n_months, 36);
        assert_eq!(cfg.synthetic.evapotranspiration, [10.0, 150.0]);
    }

    #[test]
    fn rejects_invalid_values() {
        for contents in [
            "[index]\ntimescales = []\n",
            "[index]\ntimescales = [0]\n",
            "[index]\ntimescales = [3, 3]\n",
            "[index]\ntimescales = [3]\nmin_sample = 0\n",
            "[index]\ntimescales = [3]\nestimator = \"bayesian\"\n",
            "[index]\ntimescales = [3]\n[analysis]\ndry_threshold = 0.0\nwet_threshold = 0.0\n",
            "[index]\ntimescales = [3]\n[synthetic]\nstart_year = 1980\nn_months = 10\nprecipitation = [5.0, 1.0]\nevapotranspiration = [1.0, 2.0]\n",
            "[analysis]\ndry_threshold = -1.0\nwet_threshold = 1.0\n",
        ] {
            assert!(Config::from_toml(contents).is_err(), "{contents}");
        }
    }
}
