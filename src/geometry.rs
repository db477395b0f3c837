//! Segment queries on the plane, shared by sensors, collision and track building.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Determinants smaller than this are treated as parallel lines
const PARALLEL_EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: DVec2,
    pub end: DVec2,
}

impl Segment {
    pub const fn new(start: DVec2, end: DVec2) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Point where this segment crosses `other`, if they cross. Both parameters must lie
    /// in `[0, 1]`, and parallel segments never intersect.
    pub fn intersection(&self, other: &Segment) -> Option<DVec2> {
        let d1 = self.start - self.end;
        let d2 = other.start - other.end;
        let denom = d1.perp_dot(d2);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let offset = self.start - other.start;
        let t = offset.perp_dot(d2) / denom;
        let u = -d1.perp_dot(offset) / denom;

        ((0. ..=1.).contains(&t) && (0. ..=1.).contains(&u))
            .then(|| self.start + (self.end - self.start) * t)
    }

    /// Shortest distance from `point` to any point of this segment
    pub fn distance_to(&self, point: DVec2) -> f64 {
        let along = self.end - self.start;
        let len_sq = along.length_squared();
        if len_sq == 0. {
            return point.distance(self.start);
        }

        let t = ((point - self.start).dot(along) / len_sq).clamp(0., 1.);
        point.distance(self.start + along * t)
    }
}

/// Unit vector pointing along `angle`, measured from the +x axis
#[inline]
pub fn heading(angle: f64) -> DVec2 {
    DVec2::from_angle(angle)
}
