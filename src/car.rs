//! The agent: a genotype-derived brain driving a kinematic car through sense, think, move
//! and score on every tick.

use crate::{
    config::{CarConfig, Config},
    error::{DimensionError, Error, Result},
    geometry::heading,
    network::{FeedForward, Network},
    sensor::Sensor,
    track::Track,
};
use glam::DVec2;
use tracing::trace;

/// Simulation-only state of one agent, reset whenever the agent respawns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentRuntimeState {
    /// Index of the next checkpoint to reach
    pub checkpoint: usize,
    /// Milliseconds since the last checkpoint was reached
    pub since_checkpoint: f64,
    pub fitness: f64,
    pub alive: bool,
    /// Marks the car the visualizer should follow
    pub best: bool,
}

impl Default for AgentRuntimeState {
    fn default() -> Self {
        Self {
            checkpoint: 0,
            since_checkpoint: 0.,
            fitness: 0.,
            alive: true,
            best: false,
        }
    }
}

#[inline]
fn sign(x: f64) -> f64 {
    if x > 0. {
        1.
    } else if x < 0. {
        -1.
    } else {
        0.
    }
}

#[derive(Debug, Clone)]
pub struct Car {
    genotype: usize,
    brain: FeedForward,
    sensors: Vec<Sensor>,
    physics: CarConfig,
    sensor_length: f64,
    position: DVec2,
    angle: f64,
    speed: f64,
    state: AgentRuntimeState,
}

impl Car {
    /// A car driven by `parameters`, which belong to the genotype at index `genotype` of
    /// the population. The brain must take one input per sensor and produce the two
    /// actions (throttle, steering).
    pub fn spawn(
        genotype: usize,
        parameters: &[f64],
        position: DVec2,
        angle: f64,
        config: &Config,
    ) -> Result<Self> {
        let brain = FeedForward::from_parameters(
            &config.network.topology,
            config.network.activation,
            parameters,
        )?;
        let sensors = Sensor::fan(config.sensors.count, config.sensors.spread);
        if sensors.len() != brain.inputs() {
            return Err(Error::Config(format!(
                "{} sensors can't feed a network of {} inputs",
                sensors.len(),
                brain.inputs()
            )));
        }
        if brain.outputs() != 2 {
            return Err(Error::Config(format!(
                "network must produce 2 actions (throttle, steering), got {}",
                brain.outputs()
            )));
        }

        Ok(Self {
            genotype,
            brain,
            sensors,
            physics: config.car,
            sensor_length: config.sensors.length,
            position,
            angle,
            speed: 0.,
            state: AgentRuntimeState::default(),
        })
    }

    /// Advance one tick of `dt` milliseconds. Returns the frozen fitness if the car died
    /// during this tick.
    pub fn step(&mut self, dt: f64, track: &Track) -> Result<Option<f64>, DimensionError> {
        if !self.state.alive {
            return Ok(None);
        }

        let inputs = self
            .sensors
            .iter_mut()
            .map(|sensor| sensor.cast(self.position, self.angle, track.walls(), self.sensor_length))
            .collect::<Vec<_>>();

        let actions = self.brain.forward(&inputs)?;
        self.drive(actions[0] * 2. - 1., actions[1] * 2. - 1.);
        self.state.since_checkpoint += dt;

        let progress = track.progress(self.position, self.state.checkpoint);
        if progress.checkpoint > self.state.checkpoint {
            self.state.checkpoint = progress.checkpoint;
            self.state.since_checkpoint = 0.;
        }
        self.state.fitness = progress.progress;

        if self.crashed(track) || self.state.since_checkpoint > self.physics.checkpoint_timeout {
            return Ok(Some(self.die()));
        }
        Ok(None)
    }

    /// Apply throttle and steering, both in `[-1, 1]`. A car at rest can't turn.
    fn drive(&mut self, throttle: f64, steering: f64) {
        let CarConfig {
            max_speed,
            reverse_factor,
            acceleration,
            friction,
            rotation_speed,
            ..
        } = self.physics;

        self.speed += throttle * acceleration;
        self.speed = self.speed.clamp(-max_speed * reverse_factor, max_speed);
        self.speed *= friction;

        self.angle += steering * rotation_speed * sign(self.speed);
        self.position += heading(self.angle) * self.speed;
    }

    /// Corners of the body rectangle, in world space
    pub fn corners(&self) -> [DVec2; 4] {
        let half = DVec2::new(self.physics.width, self.physics.height) / 2.;
        let rotation = heading(self.angle);
        [
            DVec2::new(half.x, half.y),
            DVec2::new(half.x, -half.y),
            DVec2::new(-half.x, half.y),
            DVec2::new(-half.x, -half.y),
        ]
        .map(|corner| self.position + rotation.rotate(corner))
    }

    fn crashed(&self, track: &Track) -> bool {
        self.corners()
            .into_iter()
            .any(|corner| track.collides(corner, self.physics.wall_clearance))
    }

    /// Kill the car, freezing and returning its fitness
    pub fn die(&mut self) -> f64 {
        self.state.alive = false;
        trace!(
            genotype = self.genotype,
            fitness = self.state.fitness,
            checkpoint = self.state.checkpoint,
            "car died"
        );
        self.state.fitness
    }

    /// Put the car back at a start pose with a fresh runtime state
    pub fn reset(&mut self, position: DVec2, angle: f64) {
        self.position = position;
        self.angle = angle;
        self.speed = 0.;
        self.state = AgentRuntimeState::default();
        for sensor in self.sensors.iter_mut() {
            *sensor = Sensor::new(sensor.angle());
        }
    }

    #[inline]
    pub fn genotype(&self) -> usize {
        self.genotype
    }

    #[inline]
    pub fn brain(&self) -> &FeedForward {
        &self.brain
    }

    #[inline]
    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    #[inline]
    pub fn position(&self) -> DVec2 {
        self.position
    }

    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    #[inline]
    pub fn state(&self) -> &AgentRuntimeState {
        &self.state
    }

    #[inline]
    pub fn fitness(&self) -> f64 {
        self.state.fitness
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.state.alive
    }

    #[inline]
    pub fn is_best(&self) -> bool {
        self.state.best
    }

    pub(crate) fn set_best(&mut self, best: bool) {
        self.state.best = best;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{NetworkConfig, SensorConfig, TrackConfig};

    const DT: f64 = 1000. / 60.;

    fn config() -> Config {
        new_t!(Config, network = new_t!(NetworkConfig, topology = vec![7, 2]))
    }

    /// A brain ignoring its sensors, whose raw outputs are `σ(throttle)`, `σ(steering)`
    fn constant_brain(throttle: f64, steering: f64) -> Vec<f64> {
        let mut weights = vec![0.; 8 * 2];
        weights[14] = throttle;
        weights[15] = steering;
        weights
    }

    fn corridor() -> Track {
        let path = (0..20)
            .map(|i| DVec2::new(100. * i as f64, 0.))
            .collect::<Vec<_>>();
        Track::from_path(&path, &TrackConfig::default()).unwrap()
    }

    #[test]
    fn test_spawn_rejects_mismatches() {
        assert!(matches!(
            Car::spawn(0, &[0.; 3], DVec2::ZERO, 0., &config()),
            Err(Error::Dimension(DimensionError::Weights { expected: 16, actual: 3 }))
        ));

        let config = new_t!(
            Config,
            sensors = new_t!(SensorConfig, count = 5),
            network = new_t!(NetworkConfig, topology = vec![7, 2])
        );
        assert!(matches!(
            Car::spawn(0, &[0.; 16], DVec2::ZERO, 0., &config),
            Err(Error::Config(_))
        ));

        let config = new_t!(Config, network = new_t!(NetworkConfig, topology = vec![7, 3]));
        assert!(matches!(
            Car::spawn(0, &[0.; 24], DVec2::ZERO, 0., &config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_no_spin_at_rest() {
        // σ(1) = 0.5 maps to zero throttle, steering is hard over
        let mut car = Car::spawn(0, &constant_brain(1., 1000.), DVec2::ZERO, 0.3, &config()).unwrap();
        for _ in 0..10 {
            car.step(DT, &corridor()).unwrap();
        }
        assert_eq!(car.speed(), 0.);
        assert_eq!(car.angle(), 0.3);
        assert_eq!(car.position(), DVec2::ZERO);
    }

    #[test]
    fn test_throttle_moves_along_heading() {
        // steering σ(1) = 0.5 maps to straight ahead
        let mut car = Car::spawn(0, &constant_brain(1000., 1.), DVec2::ZERO, 0., &config()).unwrap();
        car.step(DT, &corridor()).unwrap();

        let throttle = (1000. / 1001.) * 2. - 1.;
        let speed = throttle * 0.15 * 0.98;
        assert_f64_approx!(car.speed(), speed, epsilon = 1e-12);
        assert_f64_approx!(car.position().x, speed, epsilon = 1e-12);
        assert_f64_approx!(car.position().y, 0.);
        assert_eq!(car.angle(), 0.);
    }

    #[test]
    fn test_speed_is_capped() {
        let track = corridor();
        let mut forward = Car::spawn(0, &constant_brain(1000., 1.), DVec2::ZERO, 0., &config()).unwrap();
        let mut reverse =
            Car::spawn(1, &constant_brain(-1000., 1.), DVec2::new(1000., 0.), 0., &config()).unwrap();
        for _ in 0..200 {
            forward.step(DT, &track).unwrap();
            reverse.step(DT, &track).unwrap();
            assert!(forward.speed() <= 5.);
            assert!(reverse.speed() >= -1.5);
        }
        assert!(forward.speed() > 4.);
        assert!(reverse.speed() < -1.);
    }

    #[test]
    fn test_wall_contact_kills() {
        let track = corridor();
        // the car's left corners sit on the wall at y = 27.5
        let mut car =
            Car::spawn(0, &constant_brain(1., 1.), DVec2::new(300., 20.), 0., &config()).unwrap();
        let fitness = car.step(DT, &track).unwrap();
        assert!(!car.is_alive());
        assert_eq!(fitness, Some(car.fitness()));

        let frozen = *car.state();
        assert_eq!(car.step(DT, &track).unwrap(), None);
        assert_eq!(*car.state(), frozen);
    }

    #[test]
    fn test_checkpoint_timeout_kills() {
        let track = corridor();
        let mut car = Car::spawn(0, &constant_brain(1., 1.), DVec2::ZERO, 0., &config()).unwrap();

        let mut ticks = 0;
        while car.step(DT, &track).unwrap().is_none() {
            ticks += 1;
            assert!(ticks < 1000, "car never timed out");
        }
        // the first checkpoint sits on the start, so the clock restarts on tick one
        assert!((299..=301).contains(&ticks), "died after {ticks} ticks");
        assert_eq!(car.state().checkpoint, 1);
        // partial credit toward the checkpoint 100 units ahead
        let falloff = track.checkpoints()[1].radius * 3.;
        assert_f64_approx!(car.fitness(), 0.05 + (1. - 100. / falloff) * 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_corners() {
        let car = Car::spawn(0, &constant_brain(0., 0.), DVec2::new(10., 10.), 0., &config()).unwrap();
        let corners = car.corners();
        assert_eq!(corners[0], DVec2::new(25., 17.5));
        assert_eq!(corners[3], DVec2::new(-5., 2.5));
    }

    #[test]
    fn test_reset() {
        let track = corridor();
        let mut car = Car::spawn(0, &constant_brain(1000., 1.), DVec2::ZERO, 0., &config()).unwrap();
        for _ in 0..30 {
            car.step(DT, &track).unwrap();
        }
        car.reset(DVec2::new(5., 5.), 1.);
        assert_eq!(car.position(), DVec2::new(5., 5.));
        assert_eq!(car.angle(), 1.);
        assert_eq!(car.speed(), 0.);
        assert_eq!(*car.state(), AgentRuntimeState::default());
        assert!(car.sensors().iter().all(|s| s.output() == 1.));
    }
}
