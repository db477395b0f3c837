//! Functions related to producing a new generation from a ranked population.

use crate::{
    config::GaConfig,
    crossover::crossover,
    genotype::Genotype,
    random::{EvolutionEvent, Happens},
};
use rand::{Rng, RngCore};

/// Sample `size` members uniformly with replacement and return the index of the fittest.
/// Ties keep the earliest sample. Returns [None] for an empty population.
pub fn tournament(population: &[Genotype], size: usize, rng: &mut impl RngCore) -> Option<usize> {
    if population.is_empty() {
        return None;
    }

    let mut best = rng.random_range(0..population.len());
    for _ in 1..size {
        let candidate = rng.random_range(0..population.len());
        if population[candidate].fitness > population[best].fitness {
            best = candidate;
        }
    }
    Some(best)
}

/// Add `U(-1, 1) * amount` to each gene for which `evt` happens
pub fn mutate_with(
    parameters: &mut [f64],
    evt: EvolutionEvent,
    amount: f64,
    rng: &mut impl Happens,
) {
    for gene in parameters.iter_mut() {
        if rng.happens(evt) {
            *gene += rng.random_range(-1. ..1.) * amount;
        }
    }
}

#[inline]
pub fn mutate(parameters: &mut [f64], amount: f64, rng: &mut impl Happens) {
    mutate_with(parameters, EvolutionEvent::MutateGene, amount, rng)
}

/// Produce the next generation from `population`, which must be sorted fittest first.
/// The top `elitism_count` genotypes are carried over unchanged, and the rest are bred
/// in pairs by tournament selection, uniform crossover and per-gene mutation. The second
/// child of the final pair is dropped when the population size is odd. Every genotype of
/// the result starts with zeroed scores.
pub fn reproduce(
    population: &[Genotype],
    config: &GaConfig,
    rng: &mut impl Happens,
) -> Vec<Genotype> {
    let size = config.population_size;
    let mut next = Vec::with_capacity(size);
    next.extend(
        population
            .iter()
            .take(config.elitism_count.min(size))
            .cloned(),
    );

    while next.len() < size {
        let (Some(l), Some(r)) = (
            tournament(population, config.tournament_size, rng),
            tournament(population, config.tournament_size, rng),
        ) else {
            break;
        };

        let (mut l_child, mut r_child) =
            crossover(&population[l].parameters, &population[r].parameters, rng);
        mutate(&mut l_child, config.mutation_amount, rng);
        mutate(&mut r_child, config.mutation_amount, rng);

        next.push(Genotype::new(l_child));
        if next.len() < size {
            next.push(Genotype::new(r_child));
        }
    }

    for genotype in next.iter_mut() {
        genotype.reset_scores();
    }
    next
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::random::{ProbBinding, ProbStatic};
    use rand::{rngs::StdRng, SeedableRng};

    /// Sorted population whose fitness falls with index
    fn ranked(size: usize) -> Vec<Genotype> {
        (0..size)
            .map(|i| Genotype {
                fitness: (size - i) as f64,
                ..Genotype::new(vec![i as f64; 4])
            })
            .collect()
    }

    fn below_median_rate(size: usize, rng: &mut impl RngCore) -> f64 {
        let population = ranked(100);
        let samples = 20_000;
        let below = (0..samples)
            .filter(|_| tournament(&population, size, rng).unwrap() >= 50)
            .count();
        below as f64 / samples as f64
    }

    #[test]
    fn test_tournament_favours_fit() {
        let mut rng = StdRng::seed_from_u64(17);
        let one = below_median_rate(1, &mut rng);
        let three = below_median_rate(3, &mut rng);
        let five = below_median_rate(5, &mut rng);

        // chance alone gives 1/2, and (1/2)^size for the whole tournament to miss
        assert!((one - 0.5).abs() < 0.03, "{one}");
        assert!((three - 0.125).abs() < 0.03, "{three}");
        assert!(five < three && three < one);
    }

    #[test]
    fn test_tournament_small_populations() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(tournament(&[], 3, &mut rng), None);
        for _ in 0..100 {
            assert_eq!(tournament(&ranked(1), 3, &mut rng), Some(0));
            assert!(tournament(&ranked(2), 3, &mut rng).unwrap() < 2);
        }
    }

    #[test]
    fn test_mutate_rate_zero() {
        let mut rng = ProbBinding::new(ProbStatic::new(0., 0.), StdRng::seed_from_u64(3));
        let mut parameters = vec![0.25; 100];
        mutate(&mut parameters, 10., &mut rng);
        assert!(parameters.iter().all(|p| *p == 0.25));
    }

    #[test]
    fn test_mutate_amount_zero() {
        let mut rng = ProbBinding::new(ProbStatic::new(0., 1.), StdRng::seed_from_u64(3));
        let mut parameters = vec![0.25; 100];
        mutate(&mut parameters, 0., &mut rng);
        assert!(parameters.iter().all(|p| *p == 0.25));
    }

    #[test]
    fn test_mutate_bounded_by_amount() {
        let mut rng = ProbBinding::new(ProbStatic::new(0., 1.), StdRng::seed_from_u64(4));
        let mut parameters = vec![0.; 1000];
        mutate(&mut parameters, 0.5, &mut rng);
        assert!(parameters.iter().all(|p| p.abs() <= 0.5));
        assert!(parameters.iter().filter(|p| **p != 0.).count() > 990);
    }

    #[test]
    fn test_reproduce_sizes() {
        let mut rng = ProbBinding::new(ProbStatic::default(), StdRng::seed_from_u64(5));
        for size in [1, 2, 3, 7, 10, 11] {
            let config = new_t!(GaConfig, population_size = size, parameter_count = 4);
            let next = reproduce(&ranked(10), &config, &mut rng);
            assert_eq!(next.len(), size);
            assert!(next.iter().all(|g| g.len() == 4));
            assert!(next.iter().all(|g| g.evaluation == 0. && g.fitness == 0.));
        }
    }

    #[test]
    fn test_reproduce_keeps_elites() {
        let mut rng = ProbBinding::new(ProbStatic::new(1., 1.), StdRng::seed_from_u64(6));
        let population = ranked(10);
        let config = new_t!(GaConfig, population_size = 10, elitism_count = 3);
        let next = reproduce(&population, &config, &mut rng);
        for i in 0..3 {
            assert_eq!(next[i].parameters, population[i].parameters);
        }
    }

    #[test]
    fn test_reproduce_elitism_fills_population() {
        // selection would consume randomness, but there's nothing left to select
        let mut rng = ProbBinding::new(ProbStatic::default(), StdRng::seed_from_u64(7));
        let population = ranked(5);
        let config = new_t!(GaConfig, population_size = 3, elitism_count = 8);
        let next = reproduce(&population, &config, &mut rng);
        assert_eq!(
            next.iter().map(|g| g.parameters.clone()).collect::<Vec<_>>(),
            population[..3].iter().map(|g| g.parameters.clone()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_reproduce_empty() {
        let mut rng = ProbBinding::new(ProbStatic::default(), StdRng::seed_from_u64(8));
        let config = new_t!(GaConfig, population_size = 4);
        assert!(reproduce(&[], &config, &mut rng).is_empty());
    }
}
