//! The generational population: fitness ranking, breeding, restarts and snapshot loading.

use crate::{
    config::GaConfig,
    constants::{
        NEURODRIVE_LOAD_PERTURB_AMOUNT, NEURODRIVE_PARAM_INIT_MAX, NEURODRIVE_PARAM_INIT_MIN,
    },
    error::{DimensionError, Error, Result},
    genotype::Genotype,
    random::{EvolutionEvent, ProbBinding, ProbStatic, WyRng},
    reproduce::{mutate_with, reproduce},
};
use rand::{Rng, RngCore};
use rand_distr::Uniform;
use tracing::{debug, warn};

/// Owns the population of [Genotype]s and the randomness used to breed it. The generation
/// counter starts at 1.
#[derive(Debug, Clone)]
pub struct GeneticAlgorithm<R: RngCore = WyRng> {
    config: GaConfig,
    population: Vec<Genotype>,
    /// The last evaluated generation, fittest first, kept after it was bred from
    ranked: Vec<Genotype>,
    generation: usize,
    init: Uniform<f64>,
    rng: ProbBinding<ProbStatic, R>,
}

impl<R: RngCore> GeneticAlgorithm<R> {
    /// A population of `config.population_size` random genotypes, each parameter drawn
    /// uniformly from `[-1, 1]`
    pub fn new(config: GaConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let init = Uniform::new_inclusive(NEURODRIVE_PARAM_INIT_MIN, NEURODRIVE_PARAM_INIT_MAX)
            .map_err(|e| Error::Config(format!("parameter init range: {e}")))?;
        let rng = ProbBinding::new(
            ProbStatic::new(config.crossover_rate, config.mutation_rate),
            rng,
        );

        let mut ga = Self {
            config,
            population: vec![],
            ranked: vec![],
            generation: 1,
            init,
            rng,
        };
        ga.population = ga.random_population();
        Ok(ga)
    }

    fn random_population(&mut self) -> Vec<Genotype> {
        (0..self.config.population_size)
            .map(|_| Genotype::random(self.config.parameter_count, &self.init, &mut self.rng))
            .collect()
    }

    /// Derive every fitness as `evaluation / mean evaluation`, then sort fittest first.
    /// The sort is stable, so equally fit genotypes keep their order. When the mean isn't
    /// positive every fitness is 0.
    pub fn calculate_fitness(&mut self) {
        if self.population.is_empty() {
            return;
        }

        let total = self.population.iter().map(|g| g.evaluation).sum::<f64>();
        let average = total / self.population.len() as f64;
        if average.is_nan() || average <= 0. {
            warn!(average, generation = self.generation, "no positive evaluations, fitness zeroed");
        }

        for genotype in self.population.iter_mut() {
            genotype.fitness = if average > 0. {
                genotype.evaluation / average
            } else {
                0.
            };
        }
        self.population.sort_by(Genotype::fitter_first);
    }

    /// Replace the population with the next generation bred from the current evaluations
    pub fn evolve(&mut self) {
        self.calculate_fitness();

        let ranked = core::mem::take(&mut self.population);
        self.population = if ranked.is_empty() {
            warn!(generation = self.generation, "evolving an empty population, reseeding");
            self.random_population()
        } else {
            reproduce(&ranked, &self.config, &mut self.rng)
        };
        self.ranked = ranked;
        self.generation += 1;

        debug!(
            generation = self.generation,
            size = self.population.len(),
            "population evolved"
        );
    }

    /// Back to generation 1 with a fresh random population
    pub fn restart(&mut self) {
        self.generation = 1;
        self.population = self.random_population();
        self.ranked.clear();
        debug!(size = self.population.len(), "population restarted");
    }

    /// Seed the population from saved parameter vectors. Vectors past the population size
    /// are dropped, and missing slots are filled with perturbed copies of random saved
    /// vectors. Restarts the generation counter.
    pub fn load(&mut self, vectors: &[Vec<f64>]) -> Result<()> {
        if vectors.is_empty() {
            return Err(Error::EmptySnapshot);
        }
        if let Some(bad) = vectors
            .iter()
            .find(|v| v.len() != self.config.parameter_count)
        {
            return Err(DimensionError::Weights {
                expected: self.config.parameter_count,
                actual: bad.len(),
            }
            .into());
        }

        let size = self.config.population_size;
        let saved = if vectors.len() > size {
            warn!(
                saved = vectors.len(),
                size, "snapshot larger than the population, truncating"
            );
            &vectors[..size]
        } else {
            vectors
        };

        let mut population = saved.iter().cloned().map(Genotype::new).collect::<Vec<_>>();
        while population.len() < size {
            let mut parameters = saved[self.rng.random_range(0..saved.len())].clone();
            mutate_with(
                &mut parameters,
                EvolutionEvent::PerturbLoaded,
                NEURODRIVE_LOAD_PERTURB_AMOUNT,
                &mut self.rng,
            );
            population.push(Genotype::new(parameters));
        }

        self.population = population;
        self.ranked.clear();
        self.generation = 1;
        debug!(saved = saved.len(), size, "population loaded");
        Ok(())
    }

    /// Store the raw score earned by the genotype at `idx`. Out of range indices are ignored.
    pub fn record_evaluation(&mut self, idx: usize, evaluation: f64) {
        if let Some(genotype) = self.population.get_mut(idx) {
            genotype.evaluation = evaluation;
        }
    }

    /// The first genotype, which is the fittest once [Self::calculate_fitness] ran
    #[inline]
    pub fn best(&self) -> Option<&Genotype> {
        self.population.first()
    }

    /// The generation the current population was bred from, with its scores, fittest
    /// first. Empty until the first [Self::evolve] after a restart or load.
    #[inline]
    pub fn ranked(&self) -> &[Genotype] {
        &self.ranked
    }

    #[inline]
    pub fn population(&self) -> &[Genotype] {
        &self.population
    }

    #[inline]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[inline]
    pub fn config(&self) -> &GaConfig {
        &self.config
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn config(size: usize) -> GaConfig {
        new_t!(GaConfig, population_size = size, parameter_count = 12)
    }

    fn scored<R: RngCore>(ga: &mut GeneticAlgorithm<R>, evaluations: &[f64]) {
        for (idx, evaluation) in evaluations.iter().enumerate() {
            ga.record_evaluation(idx, *evaluation);
        }
    }

    test_t!(new_in_range[T: StdRng | WyRng]() {
        let ga = GeneticAlgorithm::new(config(20), T::seed_from_u64(1)).unwrap();
        assert_eq!(ga.generation(), 1);
        assert_eq!(ga.population().len(), 20);
        for genotype in ga.population() {
            assert_eq!(genotype.len(), 12);
            assert!(genotype.parameters.iter().all(|p| (-1. ..=1.).contains(p)));
        }
    });

    test_t!(evolve_keeps_size[T: StdRng | WyRng]() {
        for size in [1, 2, 3, 10, 11] {
            let mut ga = GeneticAlgorithm::new(config(size), T::seed_from_u64(2)).unwrap();
            for generation in 0..5 {
                let evaluations = (0..size).map(|i| (i * generation) as f64).collect::<Vec<_>>();
                scored(&mut ga, &evaluations);
                ga.evolve();
                assert_eq!(ga.population().len(), size);
                assert!(ga.population().iter().all(|g| g.len() == 12));
            }
            assert_eq!(ga.generation(), 6);
        }
    });

    test_t!(evolve_resets_scores[T: StdRng | WyRng]() {
        let mut ga = GeneticAlgorithm::new(config(10), T::seed_from_u64(3)).unwrap();
        scored(&mut ga, &[1., 2., 3., 4., 5., 6., 7., 8., 9., 10.]);
        ga.evolve();
        assert!(ga.population().iter().all(|g| g.evaluation == 0. && g.fitness == 0.));
    });

    test_t!(evolve_keeps_elites[T: StdRng | WyRng]() {
        let mut ga = GeneticAlgorithm::new(config(10), T::seed_from_u64(4)).unwrap();
        let evaluations = [3., 9., 1., 4., 7., 2., 8., 5., 6., 0.];
        scored(&mut ga, &evaluations);
        let fittest = ga.population()[1].parameters.clone();
        let runner_up = ga.population()[6].parameters.clone();

        ga.evolve();
        assert_eq!(ga.population()[0].parameters, fittest);
        assert_eq!(ga.population()[1].parameters, runner_up);
    });

    test_t!(elitism_covers_population[T: StdRng | WyRng]() {
        let mut ga = GeneticAlgorithm::new(
            new_t!(GaConfig, population_size = 3, parameter_count = 4, elitism_count = 5),
            T::seed_from_u64(5),
        )
        .unwrap();
        scored(&mut ga, &[1., 3., 2.]);
        let ranked = [1, 2, 0].map(|i| ga.population()[i].parameters.clone());

        ga.evolve();
        for (genotype, parameters) in ga.population().iter().zip(ranked.iter()) {
            assert_eq!(&genotype.parameters, parameters);
        }
    });

    test_t!(population_below_tournament_size[T: StdRng | WyRng]() {
        let mut ga = GeneticAlgorithm::new(
            new_t!(
                GaConfig,
                population_size = 2,
                parameter_count = 4,
                elitism_count = 0,
                tournament_size = 5,
            ),
            T::seed_from_u64(6),
        )
        .unwrap();
        scored(&mut ga, &[1., 2.]);
        ga.evolve();
        assert_eq!(ga.population().len(), 2);
    });

    #[test]
    fn test_fitness_relative_to_mean() {
        let mut ga = GeneticAlgorithm::new(config(3), WyRng::seed_from_u64(7)).unwrap();
        scored(&mut ga, &[1., 3., 2.]);
        ga.calculate_fitness();
        let fitness = ga.population().iter().map(|g| g.fitness).collect::<Vec<_>>();
        assert_f64_approx!(fitness[0], 1.5);
        assert_f64_approx!(fitness[1], 1.);
        assert_f64_approx!(fitness[2], 0.5);
        assert_eq!(ga.best().unwrap().evaluation, 3.);
    }

    #[test]
    fn test_fitness_stable_on_ties() {
        let mut ga = GeneticAlgorithm::new(config(4), WyRng::seed_from_u64(8)).unwrap();
        let before = ga
            .population()
            .iter()
            .map(|g| g.parameters.clone())
            .collect::<Vec<_>>();
        scored(&mut ga, &[2., 2., 2., 2.]);
        ga.calculate_fitness();
        for (genotype, parameters) in ga.population().iter().zip(before.iter()) {
            assert_eq!(&genotype.parameters, parameters);
            assert_f64_approx!(genotype.fitness, 1.);
        }
    }

    #[test]
    fn test_fitness_zeroed_without_positive_mean() {
        for evaluations in [[0., 0., 0.], [-1., 1., -3.]] {
            let mut ga = GeneticAlgorithm::new(config(3), WyRng::seed_from_u64(9)).unwrap();
            scored(&mut ga, &evaluations);
            ga.calculate_fitness();
            assert!(ga.population().iter().all(|g| g.fitness == 0.));
        }
    }

    #[test]
    fn test_evolve_keeps_ranking() {
        let mut ga = GeneticAlgorithm::new(config(4), WyRng::seed_from_u64(15)).unwrap();
        assert!(ga.ranked().is_empty());
        let parameters = ga.population()[2].parameters.clone();
        scored(&mut ga, &[1., 3., 4., 2.]);
        ga.evolve();

        assert_eq!(
            ga.ranked().iter().map(|g| g.evaluation).collect::<Vec<_>>(),
            vec![4., 3., 2., 1.]
        );
        assert_eq!(ga.ranked()[0].parameters, parameters);
        assert!(ga.population().iter().all(|g| g.evaluation == 0.));

        ga.restart();
        assert!(ga.ranked().is_empty());
        ga.evolve();
        ga.load(&[parameters]).unwrap();
        assert!(ga.ranked().is_empty());
    }

    #[test]
    fn test_restart() {
        let mut ga = GeneticAlgorithm::new(config(6), WyRng::seed_from_u64(10)).unwrap();
        ga.evolve();
        ga.evolve();
        assert_eq!(ga.generation(), 3);
        let before = ga.population().to_vec();

        ga.restart();
        assert_eq!(ga.generation(), 1);
        assert_eq!(ga.population().len(), 6);
        assert_ne!(ga.population(), &before[..]);
    }

    #[test]
    fn test_load_fills_with_perturbed_copies() {
        let mut ga = GeneticAlgorithm::new(config(10), WyRng::seed_from_u64(11)).unwrap();
        ga.evolve();
        let saved = vec![vec![0.5; 12], vec![-0.5; 12], vec![0.; 12]];
        ga.load(&saved).unwrap();

        assert_eq!(ga.generation(), 1);
        assert_eq!(ga.population().len(), 10);
        for (genotype, parameters) in ga.population().iter().zip(saved.iter()) {
            assert_eq!(&genotype.parameters, parameters);
        }
        for genotype in &ga.population()[3..] {
            assert!(saved.iter().any(|parameters| parameters
                .iter()
                .zip(genotype.parameters.iter())
                .all(|(s, p)| (s - p).abs() <= NEURODRIVE_LOAD_PERTURB_AMOUNT)));
        }
    }

    #[test]
    fn test_load_truncates() {
        let mut ga = GeneticAlgorithm::new(config(2), WyRng::seed_from_u64(12)).unwrap();
        let saved = (0..5).map(|i| vec![i as f64; 12]).collect::<Vec<_>>();
        ga.load(&saved).unwrap();
        assert_eq!(ga.population().len(), 2);
        assert_eq!(ga.population()[1].parameters, saved[1]);
    }

    #[test]
    fn test_load_rejects_bad_vectors() {
        let mut ga = GeneticAlgorithm::new(config(4), WyRng::seed_from_u64(13)).unwrap();
        let before = ga.population().to_vec();
        assert!(matches!(ga.load(&[]), Err(Error::EmptySnapshot)));
        assert!(matches!(
            ga.load(&[vec![0.; 12], vec![0.; 11]]),
            Err(Error::Dimension(DimensionError::Weights {
                expected: 12,
                actual: 11
            }))
        ));
        assert_eq!(ga.population(), &before[..]);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            GeneticAlgorithm::new(config(0), WyRng::seed_from_u64(14)),
            Err(Error::Config(_))
        ));
    }
}
