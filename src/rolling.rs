//! Trailing window aggregation.

use crate::error::{IndexError, Result};

/// Compute trailing sums over `timescale` consecutive values.
///
/// Position `i` holds the sum of positions `i + 1 - timescale ..= i`. It is
/// absent for the first `timescale - 1` positions and whenever any value in
/// the window is absent. Every window is summed from scratch in
/// chronological order, so equal windows give bitwise equal sums.
pub fn rolling_sum(values: &[Option<f64>], timescale: usize) -> Result<Vec<Option<f64>>> {
    if timescale == 0 {
        return Err(IndexError::InvalidParameter(
            "timescale must be positive".to_string(),
        ));
    }

    let mut sums = vec![None; values.len()];
    if values.len() < timescale {
        return Ok(sums);
    }

    for (i_end, sum) in sums.iter_mut().enumerate().skip(timescale - 1) {
        let window = &values[i_end + 1 - timescale..=i_end];
        *sum = window.iter().copied().sum::<Option<f64>>();
    }

    Ok(sums)
}
