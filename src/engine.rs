//! The training loop: cars drive the current population around a track, and their scores
//! breed the next generation once every car is out or the time budget runs dry.

use crate::{
    car::Car,
    config::Config,
    constants::{NEURODRIVE_SPEED_MAX, NEURODRIVE_SPEED_MIN},
    error::Result,
    network::FeedForward,
    population::GeneticAlgorithm,
    random::{default_rng, WyRng},
    snapshot::Snapshot,
    track::{Course, Track},
};
use core::ops::ControlFlow;
use glam::DVec2;
use rand::RngCore;
use serde::Serialize;
use tracing::{debug, info};

/// Summary of a finished generation, produced right before it's replaced
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationReport {
    pub generation: usize,
    pub best_evaluation: f64,
    pub average_evaluation: f64,
    /// Best evaluation of any generation since the last restart
    pub global_best: f64,
    /// Simulated milliseconds the generation lasted
    pub elapsed: f64,
}

/// Live view of the running generation, recomputed on every call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationState {
    pub generation: usize,
    pub best_fitness: f64,
    pub average_fitness: f64,
    pub alive_count: usize,
    pub total_count: usize,
    pub speed_multiplier: usize,
}

pub type EvolutionHook = Box<dyn FnMut(&GenerationReport) -> ControlFlow<()>>;

/// Callbacks fired after every generation of [SimulationEngine::run]. Every hook sees
/// every report, and the run stops once any of them breaks.
#[derive(Default)]
pub struct EvolutionHooks {
    hooks: Vec<EvolutionHook>,
}

impl EvolutionHooks {
    pub fn with(mut self, hook: impl FnMut(&GenerationReport) -> ControlFlow<()> + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Stop once `generations` generations have finished
    pub fn generation_limit(generations: usize) -> Self {
        Self::default().with(move |report| {
            if report.generation >= generations {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    pub fn fire(&mut self, report: &GenerationReport) -> ControlFlow<()> {
        let mut flow = ControlFlow::Continue(());
        for hook in self.hooks.iter_mut() {
            if hook(report).is_break() {
                flow = ControlFlow::Break(());
            }
        }
        flow
    }
}

pub struct SimulationEngine<R: RngCore = WyRng> {
    config: Config,
    track: Track,
    ga: GeneticAlgorithm<R>,
    cars: Vec<Car>,
    elapsed: f64,
    speed: usize,
    global_best: f64,
}

impl SimulationEngine<WyRng> {
    /// An engine on built-in course `course % 4`, seeded from the OS
    pub fn new(config: Config, course: usize) -> Result<Self> {
        Self::with_rng(config, course, default_rng())
    }
}

impl<R: RngCore> SimulationEngine<R> {
    pub fn with_rng(config: Config, course: usize, rng: R) -> Result<Self> {
        let track = Track::course(Course::from_index(course), &config.track)?;
        Self::with_track(config, track, rng)
    }

    /// An engine on an already built track. The genotype length is always derived from
    /// the network topology, overriding `config.evolution.parameter_count`.
    pub fn with_track(mut config: Config, track: Track, rng: R) -> Result<Self> {
        config.validate()?;
        config.evolution.parameter_count = FeedForward::weight_count_of(&config.network.topology);
        let ga = GeneticAlgorithm::new(config.evolution.clone(), rng)?;
        let speed = config
            .simulation
            .speed_multiplier
            .clamp(NEURODRIVE_SPEED_MIN, NEURODRIVE_SPEED_MAX);

        let mut engine = Self {
            config,
            track,
            ga,
            cars: vec![],
            elapsed: 0.,
            speed,
            global_best: 0.,
        };
        engine.build_cars()?;

        info!(
            population = engine.cars.len(),
            parameters = engine.config.evolution.parameter_count,
            checkpoints = engine.track.checkpoints().len(),
            "simulation ready"
        );
        Ok(engine)
    }

    /// Spawn one car per genotype of the current population at the start pose
    pub fn build_cars(&mut self) -> Result<()> {
        let cars = self
            .ga
            .population()
            .iter()
            .enumerate()
            .map(|(idx, genotype)| {
                Car::spawn(
                    idx,
                    &genotype.parameters,
                    self.track.start_position(),
                    self.track.start_angle(),
                    &self.config,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        self.cars = cars;
        self.elapsed = 0.;
        self.update_best();
        Ok(())
    }

    /// Advance every car by `dt` milliseconds, in population order. Returns the report of
    /// the generation if this step ended it, in which case the cars already belong to the
    /// next generation.
    pub fn step(&mut self, dt: f64) -> Result<Option<GenerationReport>> {
        for car in self.cars.iter_mut() {
            if let Some(fitness) = car.step(dt, &self.track)? {
                self.ga.record_evaluation(car.genotype(), fitness);
            }
        }
        self.elapsed += dt;
        self.update_best();

        let out_of_time = self
            .config
            .simulation
            .generation_time_limit
            .is_some_and(|limit| self.elapsed >= limit);
        if self.alive_count() == 0 || out_of_time {
            self.end_generation().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Run `speed_multiplier` fixed time steps, as one rendered frame would
    pub fn advance(&mut self) -> Result<Vec<GenerationReport>> {
        let mut reports = vec![];
        for _ in 0..self.speed {
            if let Some(report) = self.step(self.config.simulation.time_step)? {
                reports.push(report);
            }
        }
        Ok(reports)
    }

    /// Train with fixed time steps until a hook breaks, returning the last report
    pub fn run(&mut self, hooks: &mut EvolutionHooks) -> Result<GenerationReport> {
        loop {
            if let Some(report) = self.step(self.config.simulation.time_step)? {
                if hooks.fire(&report).is_break() {
                    return Ok(report);
                }
            }
        }
    }

    /// Mark the fittest living car, or the fittest of all once none is alive. Ties go to
    /// the earlier car.
    fn update_best(&mut self) {
        let fittest = |alive_only: bool| {
            self.cars
                .iter()
                .enumerate()
                .filter(|(_, car)| !alive_only || car.is_alive())
                .fold(None, |best: Option<(usize, f64)>, (idx, car)| match best {
                    Some((_, fitness)) if car.fitness() <= fitness => best,
                    _ => Some((idx, car.fitness())),
                })
                .map(|(idx, _)| idx)
        };
        let best = fittest(true).or_else(|| fittest(false));

        for (idx, car) in self.cars.iter_mut().enumerate() {
            car.set_best(Some(idx) == best);
        }
    }

    fn end_generation(&mut self) -> Result<GenerationReport> {
        for car in self.cars.iter() {
            self.ga.record_evaluation(car.genotype(), car.fitness());
        }

        let (best, total) = self
            .cars
            .iter()
            .fold((0., 0.), |(best, total): (f64, f64), car| {
                (best.max(car.fitness()), total + car.fitness())
            });
        let average = if self.cars.is_empty() {
            0.
        } else {
            total / self.cars.len() as f64
        };
        self.global_best = self.global_best.max(best);

        let report = GenerationReport {
            generation: self.ga.generation(),
            best_evaluation: best,
            average_evaluation: average,
            global_best: self.global_best,
            elapsed: self.elapsed,
        };
        info!(
            generation = report.generation,
            best = report.best_evaluation,
            average = report.average_evaluation,
            global_best = report.global_best,
            elapsed = report.elapsed,
            "generation complete"
        );

        self.ga.evolve();
        self.build_cars()?;
        Ok(report)
    }

    pub fn state(&self) -> SimulationState {
        let total_count = self.cars.len();
        let (best_fitness, sum) = self
            .cars
            .iter()
            .fold((0., 0.), |(best, sum): (f64, f64), car| {
                (best.max(car.fitness()), sum + car.fitness())
            });

        SimulationState {
            generation: self.ga.generation(),
            best_fitness,
            average_fitness: if total_count == 0 {
                0.
            } else {
                sum / total_count as f64
            },
            alive_count: self.alive_count(),
            total_count,
            speed_multiplier: self.speed,
        }
    }

    /// Steps per [Self::advance], clamped to `[1, 50]`
    pub fn set_speed(&mut self, multiplier: usize) {
        self.speed = multiplier.clamp(NEURODRIVE_SPEED_MIN, NEURODRIVE_SPEED_MAX);
    }

    /// Switch to built-in course `index % 4`, restarting evolution from scratch
    pub fn change_track(&mut self, index: usize) -> Result<()> {
        let course = Course::from_index(index);
        self.track = Track::course(course, &self.config.track)?;
        info!(?course, "track changed");
        self.reset()
    }

    /// Switch to a track built around a user drawn center line, restarting evolution
    pub fn set_custom_track(&mut self, path: &[DVec2]) -> Result<()> {
        self.track = Track::from_path(path, &self.config.track)?;
        info!(points = path.len(), "custom track set");
        self.reset()
    }

    /// Random population, generation 1, fresh cars
    pub fn reset(&mut self) -> Result<()> {
        self.ga.restart();
        self.global_best = 0.;
        self.build_cars()
    }

    /// Parameters of the `k` fittest genotypes, fittest first. Cars of the running
    /// generation are ranked by live fitness. Before any of them has moved, the ranking of
    /// the generation they were bred from is used instead.
    pub fn save_best(&self, k: usize) -> Snapshot {
        let previous = self.ga.ranked();
        let snapshot = if self.elapsed == 0. && !previous.is_empty() {
            previous
                .iter()
                .take(k)
                .map(|genotype| genotype.parameters.clone())
                .collect::<Vec<_>>()
        } else {
            let mut ranked = self.cars.iter().collect::<Vec<_>>();
            ranked.sort_by(|l, r| r.fitness().total_cmp(&l.fitness()));

            let population = self.ga.population();
            ranked
                .into_iter()
                .take(k)
                .map(|car| population[car.genotype()].parameters.clone())
                .collect::<Vec<_>>()
        };
        debug!(saved = snapshot.len(), "saved best genotypes");
        Snapshot(snapshot)
    }

    /// Continue training from saved genotypes, restarting the generation counter. The
    /// engine is unchanged if the snapshot doesn't fit the network.
    pub fn load(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.ga.load(snapshot.vectors())?;
        self.global_best = 0.;
        info!(saved = snapshot.len(), "snapshot loaded");
        self.build_cars()
    }

    /// The car marked for the camera to follow
    pub fn best_car(&self) -> Option<&Car> {
        self.cars.iter().find(|car| car.is_best())
    }

    pub fn alive_count(&self) -> usize {
        self.cars.iter().filter(|car| car.is_alive()).count()
    }

    #[inline]
    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    #[inline]
    pub fn track(&self) -> &Track {
        &self.track
    }

    #[inline]
    pub fn genetic_algorithm(&self) -> &GeneticAlgorithm<R> {
        &self.ga
    }

    #[inline]
    pub fn generation(&self) -> usize {
        self.ga.generation()
    }

    #[inline]
    pub fn global_best(&self) -> f64 {
        self.global_best
    }

    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
