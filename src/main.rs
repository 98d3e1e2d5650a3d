use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spei::manager::Manager;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Generate {
        #[arg(long)]
        station: String,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    Compute,

    Analyze,

    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.data_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Generate { station, seed } => mgr.generate_station(&station, seed)?,
        Command::Compute => mgr.compute_indices()?,
        Command::Analyze => mgr.analyze_indices()?,
        Command::Clean => mgr.clean_outputs()?,
    }

    Ok(())
}
