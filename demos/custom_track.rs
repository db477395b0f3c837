//! Train on a hand drawn center line, then continue training from a saved snapshot.
//!
//! `cargo run --example custom-track`

use core::{f64::consts::PI, ops::ControlFlow};
use glam::DVec2;
use neurodrive::{
    config::SimulationConfig, random::WyRng, Config, EvolutionHooks, SimulationEngine, Snapshot,
    Track,
};
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

/// A straight, a half circle and another straight, the way one would draw a U on screen
fn drawn_path() -> Vec<DVec2> {
    let mut path = (0..5)
        .map(|i| DVec2::new(100., 600. - 80. * i as f64))
        .collect::<Vec<_>>();
    path.extend((1..12).map(|i| {
        let angle = PI - PI * i as f64 / 12.;
        DVec2::new(250. + 150. * angle.cos(), 280. - 150. * angle.sin())
    }));
    path.extend((0..5).map(|i| DVec2::new(400., 280. + 80. * i as f64)));
    path
}

fn main() -> neurodrive::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config {
        simulation: SimulationConfig {
            generation_time_limit: Some(20_000.),
            ..SimulationConfig::default()
        },
        ..Config::default()
    };
    let track = Track::from_path(&drawn_path(), &config.track)?;
    let mut engine = SimulationEngine::with_track(config, track, WyRng::seed_from_u64(7))?;

    let mut hooks = EvolutionHooks::generation_limit(15).with(|report| {
        println!(
            "generation {:>3}: best {:.3} average {:.3}",
            report.generation, report.best_evaluation, report.average_evaluation
        );
        ControlFlow::Continue(())
    });
    engine.run(&mut hooks)?;

    let path = std::env::temp_dir().join("neurodrive-custom-track.json");
    engine.save_best(10).to_file(&path)?;

    let snapshot = Snapshot::from_file(&path)?;
    engine.load(&snapshot)?;
    let report = engine.run(&mut EvolutionHooks::generation_limit(5))?;
    println!(
        "after reloading {} genotypes: best {:.3}, global best {:.3}",
        snapshot.len(),
        report.best_evaluation,
        report.global_best
    );
    Ok(())
}
