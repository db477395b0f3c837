#![allow(mixed_script_confusables)]
#![allow(confusable_idents)]

#[macro_use]
pub mod macros;

pub mod car;
pub mod config;
pub mod constants;
pub mod crossover;
pub mod engine;
pub mod error;
pub mod genotype;
pub mod geometry;
pub mod network;
pub mod population;
pub mod random;
pub mod reproduce;
pub mod sensor;
pub mod snapshot;
pub mod track;

pub use car::{AgentRuntimeState, Car};
pub use config::Config;
pub use engine::{EvolutionHook, EvolutionHooks, GenerationReport, SimulationEngine, SimulationState};
pub use error::{DimensionError, Error, Result};
pub use genotype::Genotype;
pub use network::{activate, Activation, FeedForward, Network};
pub use population::GeneticAlgorithm;
pub use random::{Happens, Probabilities};
pub use sensor::Sensor;
pub use snapshot::Snapshot;
pub use track::{Checkpoint, Course, Track};
