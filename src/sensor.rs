use crate::geometry::{heading, Segment};
use glam::DVec2;

/// A fixed-angle distance ray. `output` is the distance to the nearest wall normalized by
/// the ray length, so `1.` means nothing is in range and `0.` means touching a wall.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    angle: f64,
    output: f64,
    endpoint: DVec2,
}

impl Sensor {
    /// A sensor pointing `angle` radians off the car's heading
    pub fn new(angle: f64) -> Self {
        Self {
            angle,
            output: 1.,
            endpoint: DVec2::ZERO,
        }
    }

    /// `count` sensors evenly fanned across `spread`, centered on the heading
    pub fn fan(count: usize, spread: f64) -> Vec<Self> {
        match count {
            0 => vec![],
            1 => vec![Self::new(0.)],
            _ => {
                let step = spread / (count - 1) as f64;
                (0..count)
                    .map(|i| Self::new(-spread / 2. + step * i as f64))
                    .collect()
            }
        }
    }

    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    #[inline]
    pub fn output(&self) -> f64 {
        self.output
    }

    /// Nearest hit, or the ray's tip when nothing was hit
    #[inline]
    pub fn endpoint(&self) -> DVec2 {
        self.endpoint
    }

    /// Cast from `origin` along `facing + angle`, keeping the nearest wall hit
    pub fn cast(&mut self, origin: DVec2, facing: f64, walls: &[Segment], length: f64) -> f64 {
        let tip = origin + heading(facing + self.angle) * length;
        let ray = Segment::new(origin, tip);

        let (distance, endpoint) = walls
            .iter()
            .filter_map(|wall| ray.intersection(wall))
            .map(|hit| (origin.distance(hit), hit))
            .fold((length, tip), |nearest, hit| {
                if hit.0 < nearest.0 {
                    hit
                } else {
                    nearest
                }
            });

        self.endpoint = endpoint;
        self.output = (distance / length).clamp(0., 1.);
        self.output
    }
}
