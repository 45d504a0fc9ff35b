mod config;
mod engine;
mod logger;
mod model;
mod params;
mod selection;
mod source;
mod sweep;
mod treatment;
mod variant;

use crate::config::Config;
use crate::engine::Engine;
use crate::logger::TsvLogger;
use crate::params::ParameterSet;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate the configured point once.
    Run {
        /// Write the trajectory to this file.
        #[arg(long)]
        trajectory: Option<PathBuf>,
    },

    /// Simulate every point of the configured sweep.
    Sweep {
        /// Write the sweep table to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Number of worker threads.
        #[arg(long)]
        threads: Option<usize>,
    },
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

    let cfg = Config::from_file(&args.config).context("failed to construct cfg")?;
    log::info!("{cfg:#?}");

    let seed = match cfg.init.seed {
        Some(seed) => seed,
        None => source::entropy_seed().context("failed to draw seed")?,
    };
    log::info!("seed {seed}");

    match args.command {
        Command::Run { trajectory } => run_single(&cfg, seed, trajectory)?,
        Command::Sweep { output, threads } => run_sweep(&cfg, seed, output, threads)?,
    }

    Ok(())
}

fn run_single(cfg: &Config, seed: u64, trajectory: Option<PathBuf>) -> Result<()> {
    let params = ParameterSet::from_config(cfg).context("failed to construct params")?;
    let mut engine =
        Engine::new(params, source::make_source(seed, 0)).context("failed to construct engine")?;

    let summary = match trajectory {
        Some(file) => {
            let file = File::create(&file).with_context(|| format!("failed to create {file:?}"))?;
            let mut logger = TsvLogger::new(BufWriter::new(file));
            let summary = engine
                .run(Some(&mut logger))
                .context("failed to run simulation")?;
            logger.finish()?;
            summary
        }
        None => engine.run(None).context("failed to run simulation")?,
    };

    let n_treated = engine.treated().iter().filter(|&&treated| treated).count();
    log::info!(
        "completed {} generations ({n_treated} of {} hosts treated in the last one)",
        engine.generation(),
        engine.state().hosts.len()
    );

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "host\tenv")?;
    writeln!(stdout, "{}\t{}", summary.host, summary.env)?;

    Ok(())
}

fn run_sweep(
    cfg: &Config,
    seed: u64,
    output: Option<PathBuf>,
    threads: Option<usize>,
) -> Result<()> {
    if let Some(n_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build_global()
            .context("failed to set number of threads")?;
    }

    let writer: Box<dyn Write> = match output {
        Some(file) => {
            let file = File::create(&file).with_context(|| format!("failed to create {file:?}"))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };

    sweep::perform_sweep(cfg, seed, writer).context("failed to perform sweep")?;

    Ok(())
}
