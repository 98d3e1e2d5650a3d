//! Data directory layout and the workflow behind each command.

use crate::analysis::Analyzer;
use crate::config::Config;
use crate::index::IndexTable;
use crate::series::ClimateTable;
use crate::synthetic::generate_climate;
use anyhow::{Context, Result, bail};
use glob::glob;
use rayon::prelude::*;
use rmp_serde::{decode, encode};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

const CLIMATE_PREFIX: &str = "climate-";
const CLIMATE_SUFFIX: &str = ".msgpack";

pub struct Manager {
    data_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(data_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { data_dir, cfg })
    }

    /// Write a synthetic climate table for `station`.
    pub fn generate_station(&self, station: &str, seed: u64) -> Result<()> {
        check_station(station)?;

        let table = generate_climate(station, &self.cfg.synthetic, seed)
            .context("failed to generate climate table")?;

        let file = self.climate_file(station);
        save_climate(&table, &file).with_context(|| format!("failed to save {file:?}"))?;
        log::info!("generated {file:?}");

        Ok(())
    }

    /// Compute the index table of every station.
    pub fn compute_indices(&self) -> Result<()> {
        let stations = self.list_stations().context("failed to list stations")?;
        if stations.is_empty() {
            bail!("no climate files found in {:?}", self.data_dir);
        }

        stations
            .par_iter()
            .map(|station| {
                self.compute_station(station)
                    .with_context(|| format!("failed to compute indices of {station}"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(())
    }

    /// Summarize the index table of every station.
    pub fn analyze_indices(&self) -> Result<()> {
        let stations = self.list_stations().context("failed to list stations")?;
        for station in &stations {
            let index_file = self.index_file(station);
            if !index_file.exists() {
                log::warn!("skipping {station}: {index_file:?} does not exist");
                continue;
            }

            let table = load_index(&index_file)
                .with_context(|| format!("failed to load {index_file:?}"))?;

            let mut analyzer = Analyzer::new(self.cfg.analysis.clone());
            analyzer.add_table(&table);

            let summary_file = self.summary_file(station);
            analyzer
                .save_results(&summary_file)
                .context("failed to save results")?;
            log::info!("saved {summary_file:?}");
        }

        Ok(())
    }

    /// Remove every index and summary file.
    pub fn clean_outputs(&self) -> Result<()> {
        for pattern in ["index-*.json", "summary-*.json"] {
            let pattern = self.data_dir.join(pattern);
            let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
            for file in glob(pattern)
                .context("failed to glob output files")?
                .filter_map(Result::ok)
            {
                fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
                log::info!("removed {file:?}");
            }
        }

        Ok(())
    }

    fn compute_station(&self, station: &str) -> Result<()> {
        let climate_file = self.climate_file(station);
        let climate = load_climate(&climate_file)
            .with_context(|| format!("failed to load {climate_file:?}"))?;

        let balance = climate
            .water_balance()
            .context("failed to compute water balance")?;
        let balance = if balance.is_contiguous() {
            balance
        } else {
            let filled = balance.with_missing_months();
            log::warn!(
                "{station}: marked {} skipped months as absent",
                filled.len() - balance.len()
            );
            filled
        };

        let index_cfg = &self.cfg.index;
        let table = IndexTable::compute(&balance, &index_cfg.timescales, &index_cfg.options())
            .context("failed to compute index table")?;

        for col in &table.columns {
            let n_defined = col.values.iter().flatten().count();
            log::info!(
                "{station}: {} has {n_defined} of {} values defined",
                col.name(),
                col.values.len()
            );
        }

        let index_file = self.index_file(station);
        save_index(&table, &index_file).with_context(|| format!("failed to save {index_file:?}"))?;

        Ok(())
    }

    fn list_stations(&self) -> Result<Vec<String>> {
        let pattern = self
            .data_dir
            .join(format!("{CLIMATE_PREFIX}*{CLIMATE_SUFFIX}"));
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let stations = glob(pattern)
            .context("failed to glob climate files")?
            .filter_map(Result::ok)
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?;
                let station = name.strip_prefix(CLIMATE_PREFIX)?.strip_suffix(CLIMATE_SUFFIX)?;
                Some(station.to_string())
            })
            .collect();
        Ok(stations)
    }

    fn climate_file(&self, station: &str) -> PathBuf {
        self.data_dir
            .join(format!("{CLIMATE_PREFIX}{station}{CLIMATE_SUFFIX}"))
    }

    fn index_file(&self, station: &str) -> PathBuf {
        self.data_dir.join(format!("index-{station}.json"))
    }

    fn summary_file(&self, station: &str) -> PathBuf {
        self.data_dir.join(format!("summary-{station}.json"))
    }
}

fn check_station(station: &str) -> Result<()> {
    if station.is_empty() {
        bail!("station name must not be empty");
    }
    if let Some(ch) = station
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(*ch, '_' | '-' | '.')))
    {
        bail!("station name must not contain {ch:?}");
    }
    Ok(())
}

pub fn save_climate<P: AsRef<Path>>(table: &ClimateTable, file: P) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);
    encode::write(&mut writer, table).context("failed to serialize climate table")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

pub fn load_climate<P: AsRef<Path>>(file: P) -> Result<ClimateTable> {
    let file = file.as_ref();
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let mut reader = BufReader::new(file);
    let table = decode::from_read(&mut reader).context("failed to deserialize climate table")?;
    Ok(table)
}

fn save_index<P: AsRef<Path>>(table: &IndexTable, file: P) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, table).context("failed to serialize index table")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

fn load_index<P: AsRef<Path>>(file: P) -> Result<IndexTable> {
    let file = file.as_ref();
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let reader = BufReader::new(file);
    let table = serde_json::from_reader(reader).context("failed to deserialize index table")?;
    Ok(table)
}
