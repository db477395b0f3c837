//! Centralized defaults for the driving simulation and its genetic algorithm.
//!
//! All tunables are defined here with the `NEURODRIVE_` prefix. [crate::config::Config]
//! defaults to these values, so a config file only needs to name what it overrides.

use crate::random::percent;
use core::f64::consts::PI;

// ============================================================================
// Car Physics
// ============================================================================

/// Length of the car body along its heading
pub const NEURODRIVE_CAR_WIDTH: f64 = 30.;

/// Width of the car body across its heading
pub const NEURODRIVE_CAR_HEIGHT: f64 = 15.;

/// Forward speed cap, in units per tick
pub const NEURODRIVE_MAX_SPEED: f64 = 5.;

/// Fraction of the max speed allowed in reverse
pub const NEURODRIVE_REVERSE_FACTOR: f64 = 0.3;

/// Speed gained per tick at full throttle
pub const NEURODRIVE_ACCELERATION: f64 = 0.15;

/// Multiplicative speed decay applied every tick
pub const NEURODRIVE_FRICTION: f64 = 0.98;

/// Heading change per tick at full steering lock, in radians
pub const NEURODRIVE_ROTATION_SPEED: f64 = 0.05;

/// A body corner closer than this to any wall kills the car
pub const NEURODRIVE_WALL_CLEARANCE: f64 = 2.;

// ============================================================================
// Sensors
// ============================================================================

/// Number of distance rays cast by each car
pub const NEURODRIVE_SENSOR_COUNT: usize = 7;

/// Maximum reach of a ray
pub const NEURODRIVE_SENSOR_LENGTH: f64 = 150.;

/// Total angle covered by the ray fan, centered on the heading
pub const NEURODRIVE_SENSOR_SPREAD: f64 = PI * 0.75;

// ============================================================================
// Network
// ============================================================================

/// Layer sizes, sensors first and the two actions (throttle, steering) last
pub const NEURODRIVE_TOPOLOGY: [usize; 4] = [NEURODRIVE_SENSOR_COUNT, 8, 6, 2];

// ============================================================================
// Genetic Algorithm
// ============================================================================

/// Number of genotypes per generation
pub const NEURODRIVE_POPULATION_SIZE: usize = 100;

/// Per-gene probability of swapping between the two children
pub const NEURODRIVE_CROSSOVER_RATE: f64 = 0.6;

/// Per-gene probability of mutation
pub const NEURODRIVE_MUTATION_RATE: f64 = 0.2;

/// Upper bound of a single mutation delta
pub const NEURODRIVE_MUTATION_AMOUNT: f64 = 0.5;

/// Number of best genotypes copied unchanged into the next generation
pub const NEURODRIVE_ELITISM_COUNT: usize = 2;

/// Number of individuals sampled per tournament
pub const NEURODRIVE_TOURNAMENT_SIZE: usize = 3;

/// Bounds of freshly generated parameters
pub const NEURODRIVE_PARAM_INIT_MIN: f64 = -1.;
pub const NEURODRIVE_PARAM_INIT_MAX: f64 = 1.;

/// Per-gene probability of perturbing a filler copy when loading a snapshot
pub const NEURODRIVE_LOAD_PERTURB_PROB: u64 = percent(10);

/// Upper bound of a perturbation applied to a loaded filler copy
pub const NEURODRIVE_LOAD_PERTURB_AMOUNT: f64 = 0.2;

// ============================================================================
// Track
// ============================================================================

/// Corridor width around the center line
pub const NEURODRIVE_TRACK_WIDTH: f64 = 55.;

/// Upper bound on the number of checkpoints placed along a path
pub const NEURODRIVE_MAX_CHECKPOINTS: usize = 20;

/// Checkpoint capture radius, as a fraction of the track width
pub const NEURODRIVE_CHECKPOINT_RADIUS_FACTOR: f64 = 0.8;

/// Partial credit toward the next checkpoint vanishes at this many capture radii
pub const NEURODRIVE_PROGRESS_FALLOFF: f64 = 3.;

// ============================================================================
// Simulation
// ============================================================================

/// Fixed tick length, in milliseconds (60 ticks per second)
pub const NEURODRIVE_TIME_STEP: f64 = 1000. / 60.;

/// A car that doesn't reach a new checkpoint within this many milliseconds dies
pub const NEURODRIVE_CHECKPOINT_TIMEOUT: f64 = 5000.;

/// Hard cap on a generation's simulated duration, in milliseconds
pub const NEURODRIVE_GENERATION_TIME_LIMIT: f64 = 60_000.;

/// Bounds of the steps-per-frame speed multiplier
pub const NEURODRIVE_SPEED_MIN: usize = 1;
pub const NEURODRIVE_SPEED_MAX: usize = 50;

/// Default number of genotypes written by a save
pub const NEURODRIVE_SAVE_COUNT: usize = 10;
