//! Monthly series types.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Create a period, `month` counting from 1.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        let period = Self { year, month };
        period.validate()?;
        Ok(period)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following calendar month.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Number of months elapsed since January of year 0.
    fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    fn validate(&self) -> Result<()> {
        if !(1..=9999).contains(&self.year) {
            return Err(IndexError::InvalidParameter(format!(
                "year must be in 1..=9999, but is {}",
                self.year
            )));
        }
        if !(1..=12).contains(&self.month) {
            return Err(IndexError::InvalidParameter(format!(
                "month must be in 1..=12, but is {}",
                self.month
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Monthly values indexed by strictly increasing periods.
///
/// Absent months are stored as `None`. Present values are always finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    periods: Vec<Period>,
    values: Vec<Option<f64>>,
}

impl MonthlySeries {
    /// Create a series, validating period order and values.
    pub fn new(periods: Vec<Period>, values: Vec<Option<f64>>) -> Result<Self> {
        let series = Self { periods, values };
        series.validate()?;
        Ok(series)
    }

    /// Create a series of consecutive months starting at `start`.
    pub fn consecutive(start: Period, values: Vec<Option<f64>>) -> Result<Self> {
        start.validate()?;
        let periods = std::iter::successors(Some(start), |period| Some(period.next()))
            .take(values.len())
            .collect();
        Self::new(periods, values)
    }

    /// Check the structural invariants of the series.
    ///
    /// Needed after deserialization, which bypasses [`MonthlySeries::new`].
    pub fn validate(&self) -> Result<()> {
        if self.periods.len() != self.values.len() {
            return Err(IndexError::InvalidParameter(format!(
                "series has {} periods but {} values",
                self.periods.len(),
                self.values.len()
            )));
        }
        for period in &self.periods {
            period.validate()?;
        }
        for pair in self.periods.windows(2) {
            if pair[0] >= pair[1] {
                return Err(IndexError::InvalidParameter(format!(
                    "periods must be strictly increasing, but {} is followed by {}",
                    pair[0], pair[1]
                )));
            }
        }
        if let Some((period, val)) = self
            .iter()
            .find_map(|(period, val)| val.filter(|val| !val.is_finite()).map(|val| (period, val)))
        {
            return Err(IndexError::InvalidParameter(format!(
                "value at {period} must be finite or absent, but is {val}"
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (Period, Option<f64>)> + '_ {
        self.periods.iter().copied().zip(self.values.iter().copied())
    }

    /// Number of present values.
    pub fn n_defined(&self) -> usize {
        self.values.iter().filter(|val| val.is_some()).count()
    }

    /// The first `len` entries of the series.
    pub fn head(&self, len: usize) -> Self {
        let len = len.min(self.len());
        Self {
            periods: self.periods[..len].to_vec(),
            values: self.values[..len].to_vec(),
        }
    }

    /// Replace the values while keeping the periods.
    pub(crate) fn with_values(&self, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(values.len(), self.periods.len());
        Self {
            periods: self.periods.clone(),
            values,
        }
    }

    /// Whether every period directly follows the previous one.
    pub fn is_contiguous(&self) -> bool {
        self.periods
            .windows(2)
            .all(|pair| pair[0].next() == pair[1])
    }

    /// Fail on the first skipped month.
    ///
    /// Rolling sums count positions, so a window over skipped months would
    /// span more calendar time than its timescale.
    pub fn check_contiguous(&self) -> Result<()> {
        match self.periods.windows(2).find(|pair| pair[0].next() != pair[1]) {
            Some(pair) => Err(IndexError::InvalidParameter(format!(
                "periods must be consecutive months, but {} is followed by {} \
                 (use with_missing_months to mark skipped months absent)",
                pair[0], pair[1]
            ))),
            None => Ok(()),
        }
    }

    /// Insert absent entries for the months skipped between consecutive periods.
    pub fn with_missing_months(&self) -> Self {
        let Some(&first) = self.periods.first() else {
            return self.clone();
        };
        let last = self.periods[self.periods.len() - 1];
        let n_months = (last.ordinal() - first.ordinal() + 1) as usize;

        let mut periods = Vec::with_capacity(n_months);
        let mut values = Vec::with_capacity(n_months);
        let mut entries = self.iter().peekable();
        let mut period = first;
        for _ in 0..n_months {
            let val = match entries.peek() {
                Some(&(next, val)) if next == period => {
                    entries.next();
                    val
                }
                _ => None,
            };
            periods.push(period);
            values.push(val);
            period = period.next();
        }

        Self { periods, values }
    }
}

/// Monthly climate totals of one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateRecord {
    pub period: Period,
    /// Total precipitation (mm).
    pub precipitation: Option<f64>,
    /// Total reference evapotranspiration (mm).
    pub evapotranspiration: Option<f64>,
}

/// Monthly climate totals of a station, sorted by period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateTable {
    pub station: String,
    pub records: Vec<ClimateRecord>,
}

impl ClimateTable {
    /// Climatic water balance (precipitation minus evapotranspiration).
    ///
    /// A month is absent when either total is absent.
    pub fn water_balance(&self) -> Result<MonthlySeries> {
        let periods = self.records.iter().map(|rec| rec.period).collect();
        let values = self
            .records
            .iter()
            .map(|rec| match (rec.precipitation, rec.evapotranspiration) {
                (Some(pr), Some(et)) => Some(pr - et),
                _ => None,
            })
            .collect();
        MonthlySeries::new(periods, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(year: i32, month: u32) -> Period {
        Period::new(year, month).unwrap()
    }

    #[test]
    fn period_rolls_over_year() {
        assert_eq!(period(1999, 12).next(), period(2000, 1));
        assert_eq!(period(2000, 1).next(), period(2000, 2));
        assert_eq!(period(2024, 3).to_string(), "2024-03");
    }

    #[test]
    fn period_rejects_invalid_month() {
        assert!(Period::new(2000, 0).is_err());
        assert!(Period::new(2000, 13).is_err());
    }

    #[test]
    fn period_rejects_out_of_range_year() {
        assert!(Period::new(0, 1).is_err());
        assert!(Period::new(10_000, 1).is_err());
    }

    #[test]
    fn deserialized_extreme_year_is_rejected() {
        let json = r#"{"periods":[{"year":1,"month":1},{"year":2147483647,"month":12}],"values":[1.0,2.0]}"#;
        let series: MonthlySeries = serde_json::from_str(json).unwrap();
        assert!(matches!(
            series.validate(),
            Err(IndexError::InvalidParameter(_))
        ));
    }

    #[test]
    fn consecutive_series_is_contiguous() {
        let series =
            MonthlySeries::consecutive(period(1980, 11), vec![Some(1.0), None, Some(3.0)]).unwrap();
        assert_eq!(
            series.periods(),
            &[period(1980, 11), period(1980, 12), period(1981, 1)]
        );
        assert!(series.is_contiguous());
        assert_eq!(series.n_defined(), 2);
    }

    #[test]
    fn rejects_unsorted_periods() {
        let result = MonthlySeries::new(
            vec![period(2000, 2), period(2000, 1)],
            vec![Some(1.0), Some(2.0)],
        );
        assert!(matches!(result, Err(IndexError::InvalidParameter(_))));
    }

    #[test]
    fn rejects_duplicate_periods() {
        let result = MonthlySeries::new(
            vec![period(2000, 1), period(2000, 1)],
            vec![Some(1.0), Some(2.0)],
        );
        assert!(matches!(result, Err(IndexError::InvalidParameter(_))));
    }

    #[test]
    fn rejects_non_finite_values() {
        let result = MonthlySeries::new(vec![period(2000, 1)], vec![Some(f64::NAN)]);
        assert!(matches!(result, Err(IndexError::InvalidParameter(_))));
    }

    #[test]
    fn rejects_length_mismatch() {
        let result = MonthlySeries::new(vec![period(2000, 1)], vec![]);
        assert!(matches!(result, Err(IndexError::InvalidParameter(_))));
    }

    #[test]
    fn fills_skipped_months_with_absent_values() {
        let series = MonthlySeries::new(
            vec![period(2000, 11), period(2001, 2)],
            vec![Some(1.0), Some(4.0)],
        )
        .unwrap();
        assert!(!series.is_contiguous());

        assert!(matches!(
            series.check_contiguous(),
            Err(IndexError::InvalidParameter(_))
        ));

        let filled = series.with_missing_months();
        assert!(filled.is_contiguous());
        assert!(filled.check_contiguous().is_ok());
        assert_eq!(filled.values(), &[Some(1.0), None, None, Some(4.0)]);
        assert_eq!(filled.periods()[0], period(2000, 11));
        assert_eq!(filled.periods()[3], period(2001, 2));
    }

    #[test]
    fn water_balance_is_absent_when_either_total_is() {
        let table = ClimateTable {
            station: "test".to_string(),
            records: vec![
                ClimateRecord {
                    period: period(2000, 1),
                    precipitation: Some(80.0),
                    evapotranspiration: Some(50.0),
                },
                ClimateRecord {
                    period: period(2000, 2),
                    precipitation: None,
                    evapotranspiration: Some(50.0),
                },
                ClimateRecord {
                    period: period(2000, 3),
                    precipitation: Some(10.0),
                    evapotranspiration: None,
                },
            ],
        };
        let balance = table.water_balance().unwrap();
        assert_eq!(balance.values(), &[Some(30.0), None, None]);
    }
}
