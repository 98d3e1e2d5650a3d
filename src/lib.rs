//! Standardized precipitation-evapotranspiration index (SPEI).
//!
//! Monthly water-balance values are summed over a trailing window, and every
//! rolling sum is scored against a Pearson Type III distribution fitted to
//! all rolling sums observed up to that month. The resulting probabilities
//! are mapped to standard normal scores.
//!
//! ```
//! use spei::{IndexOptions, MonthlySeries, Period, compute_index};
//!
//! let values = (0..36)
//!     .map(|i| {
//!         let base = if i % 2 == 0 { 30.0 } else { -20.0 };
//!         Some(base + i as f64)
//!     })
//!     .collect();
//! let series = MonthlySeries::consecutive(Period::new(1980, 1).unwrap(), values).unwrap();
//!
//! let index = compute_index(&series, 3, &IndexOptions::default()).unwrap();
//! assert_eq!(index.len(), 36);
//! assert!(index.values()[..2].iter().all(Option::is_none));
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod index;
pub mod manager;
pub mod optimize;
pub mod pearson3;
pub mod rolling;
pub mod series;
pub mod standardize;
pub mod stats;
pub mod synthetic;

pub use error::{IndexError, Result};
pub use index::{IndexColumn, IndexTable, compute_index, compute_index_detailed};
pub use pearson3::{Estimator, Pearson3};
pub use rolling::rolling_sum;
pub use series::{ClimateRecord, ClimateTable, MonthlySeries, Period};
pub use standardize::{IndexOptions, Standardized, normal_quantile};
