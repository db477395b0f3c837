use core::cmp::Ordering;
use rand::RngCore;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// The evolvable parameters of one agent, with the scores it earned this generation.
/// `evaluation` is the raw task score written back by the simulation, and `fitness` is
/// derived from it relative to the rest of the population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    pub parameters: Vec<f64>,
    #[serde(skip)]
    pub evaluation: f64,
    #[serde(skip)]
    pub fitness: f64,
}

impl Genotype {
    pub fn new(parameters: Vec<f64>) -> Self {
        Self {
            parameters,
            evaluation: 0.,
            fitness: 0.,
        }
    }

    /// A genotype of `count` parameters, each drawn from `dist`
    pub fn random(count: usize, dist: &Uniform<f64>, rng: &mut impl RngCore) -> Self {
        Self::new(dist.sample_iter(rng).take(count).collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Ordering that puts the fitter genotype first
    #[inline]
    pub fn fitter_first(&self, other: &Self) -> Ordering {
        other.fitness.total_cmp(&self.fitness)
    }

    pub fn reset_scores(&mut self) {
        self.evaluation = 0.;
        self.fitness = 0.;
    }
}
