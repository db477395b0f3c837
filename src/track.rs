//! Corridor tracks built around a center line, with reward-bearing checkpoints along it.

use crate::{
    config::TrackConfig,
    error::{Error, Result},
    geometry::Segment,
};
use core::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use glam::DVec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub position: DVec2,
    pub radius: f64,
    /// Share of the whole course this checkpoint is worth
    pub reward: f64,
    /// Reward for having reached at least this checkpoint, 1. for the last one
    pub accumulated_reward: f64,
}

/// Course progress of a position, given the checkpoint it was heading for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub progress: f64,
    pub checkpoint: usize,
}

/// The built-in courses, in selection order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Course {
    Oval,
    SCurve,
    Hairpins,
    InnerLoop,
}

impl Course {
    pub const ALL: [Course; 4] = [Self::Oval, Self::SCurve, Self::Hairpins, Self::InnerLoop];

    /// Course for a selector index, wrapping around the built-in list
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn start_angle(self) -> f64 {
        match self {
            Self::SCurve => -FRAC_PI_4,
            Self::Oval | Self::Hairpins | Self::InnerLoop => -FRAC_PI_2,
        }
    }

    pub fn path(self) -> Vec<DVec2> {
        let points: &[(f64, f64)] = match self {
            Self::Oval => &[
                (160., 450.), (160., 350.), (160., 280.),
                (200., 220.), (280., 180.), (380., 160.),
                (500., 160.), (620., 160.),
                (720., 180.), (800., 240.), (840., 320.),
                (850., 420.), (840., 520.),
                (800., 600.), (720., 660.), (620., 680.),
                (500., 680.), (380., 680.),
                (280., 660.), (200., 600.), (160., 520.),
            ],
            Self::SCurve => &[
                (100., 350.), (150., 280.), (220., 220.), (320., 180.), (450., 160.),
                (580., 180.), (680., 240.), (740., 320.), (760., 420.),
                (740., 520.), (680., 600.), (580., 650.),
                (450., 670.), (320., 650.),
                (220., 600.), (150., 520.), (120., 430.),
            ],
            Self::Hairpins => &[
                (100., 650.), (100., 550.), (100., 450.), (100., 350.),
                (110., 300.), (130., 250.), (170., 210.), (220., 190.), (280., 200.),
                (330., 240.), (350., 300.), (350., 380.), (340., 460.),
                (370., 530.), (430., 570.), (510., 550.), (570., 490.), (590., 410.),
                (580., 340.), (550., 280.), (520., 240.), (560., 200.), (620., 180.),
                (700., 180.),
                (780., 200.), (840., 260.), (870., 350.), (870., 460.),
                (840., 550.), (780., 620.), (680., 660.), (550., 680.), (400., 680.),
                (280., 660.), (180., 650.),
            ],
            Self::InnerLoop => &[
                (120., 650.), (120., 550.), (120., 450.), (120., 350.), (120., 250.),
                (150., 180.), (220., 130.), (320., 110.), (420., 110.),
                (500., 130.), (560., 180.), (590., 260.), (590., 360.),
                (560., 440.), (500., 500.), (420., 530.),
                (350., 520.), (300., 480.), (280., 420.), (300., 360.), (360., 320.),
                (440., 320.), (500., 360.), (520., 420.),
                (560., 480.), (620., 540.), (700., 580.), (780., 580.),
                (840., 540.), (870., 470.), (870., 380.), (840., 300.), (780., 240.),
                (700., 200.),
                (600., 180.), (500., 170.),
                (420., 200.), (360., 260.), (340., 340.),
                (360., 420.), (400., 480.), (440., 540.), (460., 600.),
                (420., 660.), (340., 680.), (240., 670.),
            ],
        };
        points.iter().map(|&(x, y)| DVec2::new(x, y)).collect()
    }
}

/// Immutable geometry of one course: walls to avoid and checkpoints to reach in order
#[derive(Debug, Clone)]
pub struct Track {
    walls: Vec<Segment>,
    checkpoints: Vec<Checkpoint>,
    start_position: DVec2,
    start_angle: f64,
    progress_falloff: f64,
}

impl Track {
    pub fn course(course: Course, config: &TrackConfig) -> Result<Self> {
        let mut track = Self::from_path(&course.path(), config)?;
        track.start_angle = course.start_angle();
        Ok(track)
    }

    /// Build a corridor of `config.width` around `path`. The corridor is closed behind
    /// the last point only, leaving the start open. The car starts on the first point,
    /// facing the second.
    pub fn from_path(path: &[DVec2], config: &TrackConfig) -> Result<Self> {
        if path.len() < 2 {
            return Err(Error::Config(format!(
                "a track path needs at least 2 points, got {}",
                path.len()
            )));
        }

        let half_width = config.width / 2.;
        let (outer, inner): (Vec<_>, Vec<_>) = (0..path.len())
            .map(|i| {
                let prev = path[i.saturating_sub(1)];
                let next = path[(i + 1).min(path.len() - 1)];
                let normal = (next - prev).normalize_or_zero().perp() * half_width;
                (path[i] + normal, path[i] - normal)
            })
            .unzip();

        let mut walls = Vec::with_capacity(2 * path.len() - 1);
        for i in 0..path.len() - 1 {
            walls.push(Segment::new(outer[i], outer[i + 1]));
            walls.push(Segment::new(inner[i], inner[i + 1]));
        }
        walls.push(Segment::new(outer[path.len() - 1], inner[path.len() - 1]));

        let count = config.max_checkpoints.min(path.len());
        let radius = config.width * config.checkpoint_radius_factor;
        let checkpoints = (0..count)
            .map(|i| Checkpoint {
                position: path[i * path.len() / count],
                radius,
                reward: 1. / count as f64,
                accumulated_reward: (i + 1) as f64 / count as f64,
            })
            .collect();

        let heading = path[1] - path[0];
        Ok(Self {
            walls,
            checkpoints,
            start_position: path[0],
            start_angle: heading.y.atan2(heading.x),
            progress_falloff: config.progress_falloff,
        })
    }

    #[inline]
    pub fn walls(&self) -> &[Segment] {
        &self.walls
    }

    #[inline]
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    #[inline]
    pub fn start_position(&self) -> DVec2 {
        self.start_position
    }

    #[inline]
    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    /// Whether `point` is closer than `clearance` to any wall
    pub fn collides(&self, point: DVec2, clearance: f64) -> bool {
        self.walls
            .iter()
            .any(|wall| wall.distance_to(point) < clearance)
    }

    /// Progress of `position` on its way to checkpoint `current`. Inside the capture
    /// radius the checkpoint is reached; otherwise the previous reward is topped up with
    /// a share of the next one that decays linearly with distance.
    pub fn progress(&self, position: DVec2, current: usize) -> Progress {
        let Some(checkpoint) = self.checkpoints.get(current) else {
            return Progress {
                progress: 1.,
                checkpoint: current,
            };
        };

        let distance = position.distance(checkpoint.position);
        if distance < checkpoint.radius {
            return Progress {
                progress: checkpoint.accumulated_reward,
                checkpoint: current + 1,
            };
        }

        let previous = current
            .checked_sub(1)
            .map_or(0., |i| self.checkpoints[i].accumulated_reward);
        let max_distance = checkpoint.radius * self.progress_falloff;
        let partial = (1. - distance / max_distance).max(0.) * checkpoint.reward;

        Progress {
            progress: previous + partial,
            checkpoint: current,
        }
    }
}
