//! Pearson Type III distribution and its estimators.
//!
//! The distribution is parameterised by location (mean), scale (standard
//! deviation) and skewness. For a non-zero skewness `g`, with `alpha = 4 / g^2`
//! and `z = (x - loc) / scale`, the variable `y = 2 z / g + alpha` follows a
//! standard gamma distribution of shape `alpha`. Support is bounded on the
//! side of the shorter tail. Near-zero skewness falls back to the normal
//! distribution.

use crate::error::{IndexError, Result};
use crate::optimize::NelderMead;
use crate::stats::{compute_l_moments, compute_moments};
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Gamma, Normal};
use statrs::function::gamma::ln_gamma;
use std::f64::consts::PI;

/// Below this absolute skewness the normal distribution is used.
///
/// Gamma shapes beyond `4 / NORMAL_SKEW_LIMIT^2` lose precision in the
/// incomplete gamma function.
pub const NORMAL_SKEW_LIMIT: f64 = 1e-3;

/// Largest absolute skewness the likelihood fit can reach (gamma shape 1).
pub const MAX_LIKELIHOOD_SKEW: f64 = 2.0;

/// Likelihood penalty per observation outside the support.
const OUT_OF_SUPPORT_PENALTY: f64 = 100.0 * 709.782712893384;

/// Procedure used to fit the three parameters to a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Estimator {
    /// Sample mean, standard deviation and adjusted skewness.
    #[default]
    MethodOfMoments,
    /// Sample L-moments with Hosking's approximation for the shape.
    LMoments,
    /// Nelder-Mead maximisation of the likelihood, started from the moments.
    MaximumLikelihood,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kernel {
    Normal(Normal),
    Gamma(Gamma),
}

/// A fitted Pearson Type III distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pearson3 {
    loc: f64,
    scale: f64,
    skew: f64,
    kernel: Kernel,
}

impl Pearson3 {
    pub fn new(loc: f64, scale: f64, skew: f64) -> Result<Self> {
        if !loc.is_finite() || !skew.is_finite() {
            return Err(IndexError::FitNonConvergence(format!(
                "parameters must be finite, but are loc = {loc}, skew = {skew}"
            )));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(IndexError::FitNonConvergence(format!(
                "scale must be positive and finite, but is {scale}"
            )));
        }

        let kernel = if skew.abs() < NORMAL_SKEW_LIMIT {
            Normal::new(0.0, 1.0).map(Kernel::Normal).map_err(fit_error)?
        } else {
            Gamma::new(4.0 / (skew * skew), 1.0)
                .map(Kernel::Gamma)
                .map_err(fit_error)?
        };

        Ok(Self {
            loc,
            scale,
            skew,
            kernel,
        })
    }

    pub fn loc(&self) -> f64 {
        self.loc
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn skew(&self) -> f64 {
        self.skew
    }

    /// Fit the distribution to `sample` with the given estimator.
    pub fn fit(sample: &[f64], estimator: Estimator) -> Result<Self> {
        match estimator {
            Estimator::MethodOfMoments => Self::fit_moments(sample),
            Estimator::LMoments => Self::fit_l_moments(sample),
            Estimator::MaximumLikelihood => Self::fit_likelihood(sample),
        }
    }

    /// Cumulative distribution function.
    pub fn cdf(&self, x: f64) -> f64 {
        let z = (x - self.loc) / self.scale;
        match &self.kernel {
            Kernel::Normal(normal) => normal.cdf(z),
            Kernel::Gamma(gamma) => {
                let y = self.gamma_arg(z);
                if self.skew > 0.0 {
                    gamma.cdf(y)
                } else {
                    gamma.sf(y)
                }
            }
        }
    }

    /// Natural logarithm of the density, `-inf` outside the support.
    pub fn ln_pdf(&self, x: f64) -> f64 {
        let z = (x - self.loc) / self.scale;
        match &self.kernel {
            Kernel::Normal(normal) => normal.ln_pdf(z) - self.scale.ln(),
            Kernel::Gamma(gamma) => {
                let y = self.gamma_arg(z);
                if !(y > 0.0) {
                    return f64::NEG_INFINITY;
                }
                gamma.ln_pdf(y) + (2.0 / self.skew.abs()).ln() - self.scale.ln()
            }
        }
    }

    fn gamma_arg(&self, z: f64) -> f64 {
        2.0 * z / self.skew + 4.0 / (self.skew * self.skew)
    }

    fn fit_moments(sample: &[f64]) -> Result<Self> {
        let moments = compute_moments(sample).ok_or_else(|| {
            IndexError::FitNonConvergence("moments need at least 3 values".to_string())
        })?;
        Self::new(moments.mean, moments.std_dev, moments.skewness)
    }

    fn fit_l_moments(sample: &[f64]) -> Result<Self> {
        let l_moments = compute_l_moments(sample).ok_or_else(|| {
            IndexError::FitNonConvergence(
                "L-moments need at least 3 values with non-zero spread".to_string(),
            )
        })?;

        let t3 = l_moments.t3.abs();
        if !(t3 < 1.0) {
            return Err(IndexError::FitNonConvergence(format!(
                "L-skewness must be below 1 in absolute value, but is {}",
                l_moments.t3
            )));
        }
        if t3 <= 1e-6 {
            return Self::new(l_moments.l1, l_moments.l2 * PI.sqrt(), 0.0);
        }

        // Rational approximation of the gamma shape (Hosking, 1997).
        let alpha = if t3 < 1.0 / 3.0 {
            let t = 3.0 * PI * t3 * t3;
            (1.0 + 0.2906 * t) / (t + 0.1882 * t * t + 0.0442 * t * t * t)
        } else {
            let t = 1.0 - t3;
            (0.36067 * t - 0.59567 * t * t + 0.25361 * t * t * t)
                / (1.0 - 2.78861 * t + 2.56096 * t * t - 0.77045 * t * t * t)
        };
        let rt_alpha = alpha.sqrt();
        let beta = PI.sqrt() * l_moments.l2 * (ln_gamma(alpha) - ln_gamma(alpha + 0.5)).exp();

        Self::new(
            l_moments.l1,
            beta * rt_alpha,
            2.0 / rt_alpha * l_moments.t3.signum(),
        )
    }

    /// Likelihood fit with the skewness bounded by `MAX_LIKELIHOOD_SKEW`.
    ///
    /// The skewness is searched as `2 tanh(t)`, which keeps the gamma shape at
    /// or above 1 where the likelihood is bounded. When the iteration limit is
    /// reached the best vertex is kept.
    fn fit_likelihood(sample: &[f64]) -> Result<Self> {
        let start = Self::fit_moments(sample)?;
        let skew_bound = 0.999 * MAX_LIKELIHOOD_SKEW;
        let start_skew = start.skew.clamp(-skew_bound, skew_bound);

        let to_skew = |t: f64| MAX_LIKELIHOOD_SKEW * t.tanh();
        let neg_ln_likelihood =
            |theta: &[f64]| match Self::new(theta[1], theta[2].exp(), to_skew(theta[0])) {
                Ok(dist) => dist.penalized_nll(sample),
                Err(_) => f64::INFINITY,
            };

        let optimizer = NelderMead {
            max_iters: 5000,
            f_tol: 1e-7,
            x_tol: 1e-7,
            ..NelderMead::default()
        };
        let min = optimizer.minimize(
            neg_ln_likelihood,
            &[
                (start_skew / MAX_LIKELIHOOD_SKEW).atanh(),
                start.loc,
                start.scale.ln(),
            ],
        );

        if !min.value.is_finite() {
            return Err(IndexError::FitNonConvergence(format!(
                "likelihood is not finite at the optimum ({})",
                min.value
            )));
        }
        if !min.converged {
            log::debug!(
                "likelihood maximisation stopped after {} iterations, keeping the best vertex",
                min.n_iters
            );
        }

        Self::new(min.point[1], min.point[2].exp(), to_skew(min.point[0]))
    }

    /// Negative log-likelihood, with a fixed penalty for points outside the support.
    fn penalized_nll(&self, sample: &[f64]) -> f64 {
        sample
            .iter()
            .map(|&x| {
                let ln_pdf = self.ln_pdf(x);
                if ln_pdf.is_finite() {
                    -ln_pdf
                } else {
                    OUT_OF_SUPPORT_PENALTY
                }
            })
            .sum()
    }
}

fn fit_error<E: std::fmt::Display>(err: E) -> IndexError {
    IndexError::FitNonConvergence(err.to_string())
}
