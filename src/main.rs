//! Headless trainer: evolve drivers on a course and optionally persist the best of them.

use clap::Parser;
use glam::DVec2;
use neurodrive::{
    random::{default_rng, WyRng},
    Config, EvolutionHooks, Result, SimulationEngine, Snapshot, Track,
};
use rand::SeedableRng;
use std::{fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "neurodrive")]
#[command(version)]
#[command(about = "Evolve neural network drivers on a 2D track")]
struct Cli {
    /// Configuration file (JSON), defaults are used for anything missing
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in course, wrapping around the 4 available
    #[arg(long, default_value_t = 0)]
    course: usize,

    /// Custom course center line, a JSON list of [x, y] points. Overrides --course
    #[arg(long)]
    path: Option<PathBuf>,

    /// Number of generations to train
    #[arg(short, long, default_value_t = 50)]
    generations: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Snapshot to continue training from
    #[arg(long)]
    load: Option<PathBuf>,

    /// Where to save the fittest genotypes of the last generation once training is done
    #[arg(long)]
    save: Option<PathBuf>,

    /// Number of genotypes to save
    #[arg(long, default_value_t = neurodrive::constants::NEURODRIVE_SAVE_COUNT)]
    top: usize,
}

fn read_path(path: &PathBuf) -> Result<Vec<DVec2>> {
    let points: Vec<[f64; 2]> = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(points.into_iter().map(DVec2::from_array).collect())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let rng = cli.seed.map_or_else(default_rng, WyRng::seed_from_u64);

    let mut engine = match &cli.path {
        Some(path) => {
            let track = Track::from_path(&read_path(path)?, &config.track)?;
            SimulationEngine::with_track(config, track, rng)?
        }
        None => SimulationEngine::with_rng(config, cli.course, rng)?,
    };

    if let Some(path) = &cli.load {
        engine.load(&Snapshot::from_file(path)?)?;
    }

    let report = engine.run(&mut EvolutionHooks::generation_limit(cli.generations))?;
    println!("{}", serde_json::to_string(&report)?);

    if let Some(path) = &cli.save {
        let snapshot = engine.save_best(cli.top);
        snapshot.to_file(path)?;
        info!(saved = snapshot.len(), path = %path.display(), "snapshot saved");
    }
    Ok(())
}
