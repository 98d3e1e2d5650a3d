//! Property tests for the index engine.

use proptest::prelude::*;
use spei::{
    Estimator, IndexOptions, IndexTable, MonthlySeries, Period, compute_index, rolling_sum,
};

fn start() -> Period {
    Period::new(1990, 1).unwrap()
}

fn series(values: Vec<Option<f64>>) -> MonthlySeries {
    MonthlySeries::consecutive(start(), values).unwrap()
}

/// Monthly water balances with roughly one month in ten absent.
fn water_balance(max_len: usize) -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(
        prop_oneof![1 => Just(None), 9 => (-150.0..150.0f64).prop_map(Some)],
        0..max_len,
    )
}

fn estimator() -> impl Strategy<Value = Estimator> {
    prop_oneof![
        Just(Estimator::MethodOfMoments),
        Just(Estimator::LMoments),
        Just(Estimator::MaximumLikelihood),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rolling_sum_is_defined_iff_window_is_complete(
        values in water_balance(60),
        timescale in 1usize..13,
    ) {
        let sums = rolling_sum(&values, timescale).unwrap();
        prop_assert_eq!(sums.len(), values.len());
        for (i, sum) in sums.iter().enumerate() {
            let complete = i + 1 >= timescale
                && values[i + 1 - timescale..=i].iter().all(Option::is_some);
            prop_assert_eq!(sum.is_some(), complete);
        }
    }

    #[test]
    fn short_series_has_no_index(timescale in 1usize..25) {
        let values = vec![Some(10.0); timescale - 1];
        let index = compute_index(&series(values), timescale, &IndexOptions::default()).unwrap();
        prop_assert_eq!(index.len(), timescale - 1);
        prop_assert_eq!(index.n_defined(), 0);
    }

    #[test]
    fn index_is_deterministic(
        values in water_balance(60),
        timescale in 1usize..7,
        estimator in estimator(),
    ) {
        let input = series(values);
        let opts = IndexOptions { estimator, min_sample: 5 };
        let first = compute_index(&input, timescale, &opts).unwrap();
        let second = compute_index(&input, timescale, &opts).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn truncation_does_not_change_earlier_values(
        values in water_balance(60),
        timescale in 1usize..7,
        cut in 0usize..60,
        estimator in estimator(),
    ) {
        let input = series(values);
        let opts = IndexOptions { estimator, min_sample: 4 };
        let full = compute_index(&input, timescale, &opts).unwrap();
        let head = compute_index(&input.head(cut), timescale, &opts).unwrap();
        prop_assert_eq!(head.values(), &full.values()[..head.len()]);
    }

    #[test]
    fn index_values_are_finite_and_bounded(
        values in water_balance(80),
        timescale in 1usize..13,
        estimator in estimator(),
    ) {
        let opts = IndexOptions { estimator, min_sample: 5 };
        let index = compute_index(&series(values), timescale, &opts).unwrap();
        for val in index.values().iter().flatten() {
            prop_assert!(val.is_finite());
            prop_assert!(val.abs() < 8.3, "value {} out of bounds", val);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn likelihood_index_is_defined_after_leading_gap(
        values in prop::collection::vec((-150.0..150.0f64).prop_map(Some), 12..60),
        timescale in 1usize..7,
    ) {
        let opts = IndexOptions { estimator: Estimator::MaximumLikelihood, min_sample: 5 };
        let index = compute_index(&series(values), timescale, &opts).unwrap();
        let first = timescale - 1 + opts.min_sample - 1;
        for (pos, val) in index.values().iter().enumerate() {
            prop_assert_eq!(val.is_some(), pos >= first, "position {}", pos);
        }
    }
}

#[test]
fn timescales_have_increasing_leading_gaps() {
    let values: Vec<Option<f64>> = (0..120)
        .map(|i| Some(60.0 * (i as f64 * 0.52).sin() + 15.0 * (i as f64 * 1.7).cos()))
        .collect();
    let input = series(values);
    let opts = IndexOptions::default();

    let table = IndexTable::compute(&input, &[3, 6, 12], &opts).unwrap();
    for (col, n_gap) in table.columns.iter().zip([2, 5, 11]) {
        let sums = rolling_sum(input.values(), col.timescale).unwrap();
        assert_eq!(sums.iter().take_while(|sum| sum.is_none()).count(), n_gap);

        assert_eq!(col.values.len(), 120);
        let n_leading = col.values.iter().take_while(|val| val.is_none()).count();
        assert_eq!(n_leading, n_gap + opts.min_sample - 1);
        assert!(col.values[n_leading..].iter().all(Option::is_some));
    }
}
