//! Running and batch sample statistics.

use serde::{Deserialize, Serialize};

/// Running mean and variance (Welford's algorithm).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            n_vals: self.n_vals,
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

/// Sample moments of a finite sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub mean: f64,
    /// Standard deviation with the `n - 1` denominator.
    pub std_dev: f64,
    /// Adjusted Fisher-Pearson skewness coefficient.
    pub skewness: f64,
}

/// Compute mean, standard deviation and skewness.
///
/// Returns `None` for fewer than three values.
pub fn compute_moments(sample: &[f64]) -> Option<Moments> {
    let n_vals = sample.len();
    if n_vals < 3 {
        return None;
    }
    let n = n_vals as f64;

    let mean = sample.iter().sum::<f64>() / n;
    let (m2, m3) = sample.iter().fold((0.0, 0.0), |(m2, m3), &val| {
        let diff = val - mean;
        (m2 + diff * diff, m3 + diff * diff * diff)
    });
    let (m2, m3) = (m2 / n, m3 / n);

    let std_dev = (m2 * n / (n - 1.0)).sqrt();
    let skewness = if m2 > 0.0 {
        m3 / m2.powf(1.5) * (n * (n - 1.0)).sqrt() / (n - 2.0)
    } else {
        0.0
    };

    Some(Moments {
        mean,
        std_dev,
        skewness,
    })
}

/// First two sample L-moments and the L-skewness ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LMoments {
    pub l1: f64,
    pub l2: f64,
    pub t3: f64,
}

/// Compute sample L-moments from unbiased probability weighted moments.
///
/// Returns `None` for fewer than three values or a zero L-scale.
pub fn compute_l_moments(sample: &[f64]) -> Option<LMoments> {
    let n_vals = sample.len();
    if n_vals < 3 {
        return None;
    }
    let n = n_vals as f64;

    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);
    if sorted[0] == sorted[n_vals - 1] {
        return None;
    }

    let (mut b0, mut b1, mut b2) = (0.0, 0.0, 0.0);
    for (idx, &val) in sorted.iter().enumerate() {
        let j = idx as f64;
        b0 += val;
        b1 += val * j / (n - 1.0);
        b2 += val * j * (j - 1.0) / ((n - 1.0) * (n - 2.0));
    }
    let (b0, b1, b2) = (b0 / n, b1 / n, b2 / n);

    let l1 = b0;
    let l2 = 2.0 * b1 - b0;
    let l3 = 6.0 * b2 - 6.0 * b1 + b0;
    if !(l2 > 0.0) {
        return None;
    }

    Some(LMoments { l1, l2, t3: l3 / l2 })
}
