//! Run configuration, defaulting to [crate::constants].
//!
//! Every section is optional in a config file; missing sections and fields fall back to
//! their defaults.

use crate::{
    constants::*,
    error::{Error, Result},
    network::Activation,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub car: CarConfig,
    pub sensors: SensorConfig,
    pub network: NetworkConfig,
    pub evolution: GaConfig,
    pub track: TrackConfig,
    pub simulation: SimulationConfig,
}

/// Kinematics and body of a car
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarConfig {
    pub width: f64,
    pub height: f64,
    pub max_speed: f64,
    /// Reverse speed cap, as a fraction of `max_speed`
    pub reverse_factor: f64,
    pub acceleration: f64,
    pub friction: f64,
    pub rotation_speed: f64,
    pub wall_clearance: f64,
    /// Milliseconds without a new checkpoint before the car dies
    pub checkpoint_timeout: f64,
}

impl Default for CarConfig {
    fn default() -> Self {
        Self {
            width: NEURODRIVE_CAR_WIDTH,
            height: NEURODRIVE_CAR_HEIGHT,
            max_speed: NEURODRIVE_MAX_SPEED,
            reverse_factor: NEURODRIVE_REVERSE_FACTOR,
            acceleration: NEURODRIVE_ACCELERATION,
            friction: NEURODRIVE_FRICTION,
            rotation_speed: NEURODRIVE_ROTATION_SPEED,
            wall_clearance: NEURODRIVE_WALL_CLEARANCE,
            checkpoint_timeout: NEURODRIVE_CHECKPOINT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub count: usize,
    pub length: f64,
    /// Total fan angle in radians
    pub spread: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            count: NEURODRIVE_SENSOR_COUNT,
            length: NEURODRIVE_SENSOR_LENGTH,
            spread: NEURODRIVE_SENSOR_SPREAD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub topology: Vec<usize>,
    pub activation: Activation,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            topology: NEURODRIVE_TOPOLOGY.to_vec(),
            activation: Activation::default(),
        }
    }
}

/// Parameters of the genetic algorithm. `parameter_count` is derived from the network
/// topology when a [crate::SimulationEngine] is built, and only needs to be set when a
/// [crate::GeneticAlgorithm] is used on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    pub population_size: usize,
    pub parameter_count: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub mutation_amount: f64,
    pub elitism_count: usize,
    pub tournament_size: usize,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: NEURODRIVE_POPULATION_SIZE,
            parameter_count: 0,
            crossover_rate: NEURODRIVE_CROSSOVER_RATE,
            mutation_rate: NEURODRIVE_MUTATION_RATE,
            mutation_amount: NEURODRIVE_MUTATION_AMOUNT,
            elitism_count: NEURODRIVE_ELITISM_COUNT,
            tournament_size: NEURODRIVE_TOURNAMENT_SIZE,
        }
    }
}

impl GaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(Error::Config("population_size must be non-zero".into()));
        }
        if self.tournament_size == 0 {
            return Err(Error::Config("tournament_size must be non-zero".into()));
        }
        for (name, rate) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0. ..=1.).contains(&rate) {
                return Err(Error::Config(format!("{name} {rate} outside of [0, 1]")));
            }
        }
        if !self.mutation_amount.is_finite() || self.mutation_amount < 0. {
            return Err(Error::Config(format!(
                "mutation_amount {} must be finite and non-negative",
                self.mutation_amount
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub width: f64,
    pub max_checkpoints: usize,
    /// Capture radius as a fraction of `width`
    pub checkpoint_radius_factor: f64,
    /// Partial credit reaches zero at this many capture radii from the next checkpoint
    pub progress_falloff: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            width: NEURODRIVE_TRACK_WIDTH,
            max_checkpoints: NEURODRIVE_MAX_CHECKPOINTS,
            checkpoint_radius_factor: NEURODRIVE_CHECKPOINT_RADIUS_FACTOR,
            progress_falloff: NEURODRIVE_PROGRESS_FALLOFF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed tick length in milliseconds
    pub time_step: f64,
    /// Generation ends once this many milliseconds are simulated, if set
    pub generation_time_limit: Option<f64>,
    pub speed_multiplier: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: NEURODRIVE_TIME_STEP,
            generation_time_limit: Some(NEURODRIVE_GENERATION_TIME_LIMIT),
            speed_multiplier: NEURODRIVE_SPEED_MIN,
        }
    }
}

impl Config {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(&fs::read_to_string(path)?)
    }

    pub fn to_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every cross-section invariant. A config that fails here describes a network
    /// the cars can't drive, and must not be used.
    pub fn validate(&self) -> Result<()> {
        let topology = &self.network.topology;
        if topology.len() < 2 {
            return Err(Error::Config(
                "topology needs at least an input and an output layer".into(),
            ));
        }
        if let Some(idx) = topology.iter().position(|n| *n == 0) {
            return Err(Error::Config(format!("topology layer {idx} is empty")));
        }
        if topology[0] != self.sensors.count {
            return Err(Error::Config(format!(
                "{} sensors can't feed a network of {} inputs",
                self.sensors.count, topology[0]
            )));
        }
        if topology[topology.len() - 1] != 2 {
            return Err(Error::Config(format!(
                "network must produce 2 actions (throttle, steering), got {}",
                topology[topology.len() - 1]
            )));
        }
        if self.sensors.length <= 0. {
            return Err(Error::Config("sensor length must be positive".into()));
        }
        if self.track.width <= 0. {
            return Err(Error::Config("track width must be positive".into()));
        }
        if self.track.max_checkpoints == 0 {
            return Err(Error::Config("max_checkpoints must be non-zero".into()));
        }
        if self.simulation.time_step <= 0. {
            return Err(Error::Config("time_step must be positive".into()));
        }
        self.evolution.validate()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_str(r#"{"evolution": {"population_size": 12}}"#).unwrap();
        assert_eq!(config.evolution.population_size, 12);
        assert_eq!(config.evolution.elitism_count, NEURODRIVE_ELITISM_COUNT);
        assert_eq!(config.network.topology, NEURODRIVE_TOPOLOGY.to_vec());
        assert_eq!(config.car, CarConfig::default());
    }

    #[test]
    fn test_round_trip() {
        let config = new_t!(
            Config,
            sensors = new_t!(SensorConfig, count = 5),
            network = new_t!(NetworkConfig, topology = vec![5, 4, 2]),
        );
        let back = Config::from_str(&config.to_string().unwrap()).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_sensor_count_mismatch() {
        let config = new_t!(Config, sensors = new_t!(SensorConfig, count = 5));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_bad_topologies() {
        for topology in [vec![7], vec![7, 0, 2], vec![7, 8, 3]] {
            let config = new_t!(Config, network = new_t!(NetworkConfig, topology = topology));
            assert!(matches!(config.validate(), Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_bad_rates() {
        for ga in [
            new_t!(GaConfig, crossover_rate = 1.5),
            new_t!(GaConfig, mutation_rate = -0.1),
            new_t!(GaConfig, population_size = 0),
            new_t!(GaConfig, tournament_size = 0),
            new_t!(GaConfig, mutation_amount = f64::NAN),
        ] {
            assert!(matches!(ga.validate(), Err(Error::Config(_))));
        }
    }
}
