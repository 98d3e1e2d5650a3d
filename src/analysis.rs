//! Summaries of computed index columns.

use crate::config::AnalysisConfig;
use crate::index::{IndexColumn, IndexTable};
use crate::stats::Accumulator;
use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs::File, io::BufWriter, path::Path};

/// Observable of an index column.
pub trait Obs {
    fn update(&mut self, val: Option<f64>);
    fn report(&self) -> serde_json::Value;
}

pub struct Coverage {
    n_defined: usize,
    n_absent: usize,
    n_leading_absent: Option<usize>,
}

impl Coverage {
    pub fn new() -> Self {
        Self {
            n_defined: 0,
            n_absent: 0,
            n_leading_absent: None,
        }
    }
}

impl Obs for Coverage {
    fn update(&mut self, val: Option<f64>) {
        match val {
            Some(_) => {
                if self.n_leading_absent.is_none() {
                    self.n_leading_absent = Some(self.n_absent);
                }
                self.n_defined += 1;
            }
            None => self.n_absent += 1,
        }
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({
            "coverage": {
                "n_defined": self.n_defined,
                "n_absent": self.n_absent,
                "n_leading_absent": self.n_leading_absent.unwrap_or(self.n_absent),
            }
        })
    }
}

pub struct Moments {
    acc: Accumulator,
}

impl Moments {
    pub fn new() -> Self {
        Self {
            acc: Accumulator::new(),
        }
    }
}

impl Obs for Moments {
    fn update(&mut self, val: Option<f64>) {
        if let Some(val) = val {
            self.acc.add(val);
        }
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "moments": self.acc.report() })
    }
}

pub struct Extremes {
    min: Option<f64>,
    max: Option<f64>,
}

impl Extremes {
    pub fn new() -> Self {
        Self {
            min: None,
            max: None,
        }
    }
}

impl Obs for Extremes {
    fn update(&mut self, val: Option<f64>) {
        let Some(val) = val else {
            return;
        };
        self.min = Some(self.min.map_or(val, |min| min.min(val)));
        self.max = Some(self.max.map_or(val, |max| max.max(val)));
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "extremes": { "min": self.min, "max": self.max } })
    }
}

/// Rainfall category of an index value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Dry,
    NearNormal,
    Wet,
}

impl Category {
    pub fn classify(val: f64, cfg: &AnalysisConfig) -> Self {
        if val <= cfg.dry_threshold {
            Category::Dry
        } else if val >= cfg.wet_threshold {
            Category::Wet
        } else {
            Category::NearNormal
        }
    }
}

pub struct Categories {
    cfg: AnalysisConfig,
    counts: [usize; 3],
}

impl Categories {
    pub fn new(cfg: &AnalysisConfig) -> Self {
        Self {
            cfg: cfg.clone(),
            counts: [0; 3],
        }
    }
}

impl Obs for Categories {
    fn update(&mut self, val: Option<f64>) {
        if let Some(val) = val {
            self.counts[Category::classify(val, &self.cfg) as usize] += 1;
        }
    }

    fn report(&self) -> serde_json::Value {
        let n_vals: usize = self.counts.iter().sum();
        let freq = |count: usize| {
            if n_vals > 0 {
                count as f64 / n_vals as f64
            } else {
                f64::NAN
            }
        };
        let [dry, near_normal, wet] = self.counts;
        serde_json::json!({
            "categories": {
                "dry": { "count": dry, "freq": freq(dry) },
                "near-normal": { "count": near_normal, "freq": freq(near_normal) },
                "wet": { "count": wet, "freq": freq(wet) },
            }
        })
    }
}

/// Summary of every column of an index table.
pub struct Analyzer {
    cfg: AnalysisConfig,
    reports: Vec<serde_json::Value>,
}

impl Analyzer {
    pub fn new(cfg: AnalysisConfig) -> Self {
        Self {
            cfg,
            reports: Vec::new(),
        }
    }

    pub fn add_table(&mut self, table: &IndexTable) {
        for col in &table.columns {
            self.add_column(col);
        }
    }

    pub fn add_column(&mut self, col: &IndexColumn) {
        let mut obs_ptr_vec: Vec<Box<dyn Obs>> = vec![
            Box::new(Coverage::new()),
            Box::new(Moments::new()),
            Box::new(Extremes::new()),
            Box::new(Categories::new(&self.cfg)),
        ];
        for &val in &col.values {
            for obs in &mut obs_ptr_vec {
                obs.update(val);
            }
        }

        let mut report = serde_json::json!({ "column": col.name() });
        for obs in &obs_ptr_vec {
            if let (Some(report), serde_json::Value::Object(fields)) =
                (report.as_object_mut(), obs.report())
            {
                report.extend(fields);
            }
        }
        self.reports.push(report);
    }

    pub fn reports(&self) -> &[serde_json::Value] {
        &self.reports
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, &self.reports).context("failed to serialize reports")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Period;

    fn table() -> IndexTable {
        IndexTable {
            periods: std::iter::successors(Period::new(2000, 1).ok(), |p| Some(p.next()))
                .take(6)
                .collect(),
            columns: vec![IndexColumn {
                timescale: 3,
                values: vec![None, None, Some(-1.5), Some(0.2), Some(1.0), Some(2.3)],
            }],
        }
    }

    #[test]
    fn classifies_with_inclusive_thresholds() {
        let cfg = AnalysisConfig::default();
        assert_eq!(Category::classify(-1.0, &cfg), Category::Dry);
        assert_eq!(Category::classify(-0.99, &cfg), Category::NearNormal);
        assert_eq!(Category::classify(0.99, &cfg), Category::NearNormal);
        assert_eq!(Category::classify(1.0, &cfg), Category::Wet);
    }

    #[test]
    fn reports_column_summary() {
        let mut analyzer = Analyzer::new(AnalysisConfig::default());
        analyzer.add_table(&table());

        let report = &analyzer.reports()[0];
        assert_eq!(report["column"], "spei_3");
        assert_eq!(report["coverage"]["n_defined"], 4);
        assert_eq!(report["coverage"]["n_leading_absent"], 2);
        assert_eq!(report["moments"]["n_vals"], 4);
        assert_eq!(report["extremes"]["min"], -1.5);
        assert_eq!(report["extremes"]["max"], 2.3);
        assert_eq!(report["categories"]["dry"]["count"], 1);
        assert_eq!(report["categories"]["near-normal"]["count"], 1);
        assert_eq!(report["categories"]["wet"]["count"], 2);
    }

    #[test]
    fn empty_column_reports_all_absent() {
        let mut analyzer = Analyzer::new(AnalysisConfig::default());
        analyzer.add_column(&IndexColumn {
            timescale: 12,
            values: vec![None; 5],
        });

        let report = &analyzer.reports()[0];
        assert_eq!(report["coverage"]["n_leading_absent"], 5);
        assert!(report["extremes"]["min"].is_null());
    }
}
