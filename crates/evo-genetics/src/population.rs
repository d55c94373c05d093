//! Fixed-size population and generational replacement.

use crate::genome::Individual;
use crate::operators::Breeder;
use crate::selection::Selector;
use evo_core::{Error, FitnessStats, GeneticConfig, Result};
use rand::Rng;
use tracing::{debug, instrument};

pub struct Population {
    individuals: Vec<Individual>,
    config: GeneticConfig,
    breeder: Breeder,
    generation: u64,
}

impl Population {
    /// `num_individuals` random individuals with genomes of `gene_length` moves
    pub fn new<R: Rng + ?Sized>(config: GeneticConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let individuals = (0..config.num_individuals)
            .map(|_| Individual::new_random(&config, rng))
            .collect();

        Ok(Self {
            individuals,
            breeder: Breeder::new(&config),
            config,
            generation: 0,
        })
    }

    /// Population seeded with caller-supplied individuals
    pub fn from_individuals(config: GeneticConfig, individuals: Vec<Individual>) -> Result<Self> {
        let config = GeneticConfig {
            num_individuals: individuals.len(),
            ..config
        };
        config.validate()?;

        if let Some(bad) = individuals
            .iter()
            .find(|ind| ind.genome.len() != config.gene_length)
        {
            return Err(Error::InvalidConfiguration(format!(
                "genome length {} does not match gene length {}",
                bad.genome.len(),
                config.gene_length
            )));
        }

        Ok(Self {
            individuals,
            breeder: Breeder::new(&config),
            config,
            generation: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// Writes one fitness per individual, matched by index
    pub fn assign_fitness(&mut self, fitness: &[u32]) -> Result<()> {
        if fitness.len() != self.individuals.len() {
            return Err(Error::InvalidState(format!(
                "got {} fitness values for {} individuals",
                fitness.len(),
                self.individuals.len()
            )));
        }

        for (individual, &value) in self.individuals.iter_mut().zip(fitness) {
            individual.fitness = value;
        }
        Ok(())
    }

    /// Max, min and mean fitness of the current individuals
    pub fn stats(&self) -> Result<FitnessStats> {
        FitnessStats::from_values(self.individuals.iter().map(|ind| ind.fitness)).ok_or_else(
            || Error::InvalidState("cannot compute statistics of an empty population".to_string()),
        )
    }

    /// Fittest individual; the earliest one wins ties
    pub fn best(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .reduce(|best, ind| if ind.fitness > best.fitness { ind } else { best })
    }

    /// Replaces every individual with a child bred from the current generation.
    ///
    /// With elitism the fittest individual is carried over unchanged into
    /// slot 0. Every new individual starts with fitness 0.
    #[instrument(skip(self, rng), fields(generation = self.generation))]
    pub fn create_new_generation<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let selector = Selector::new(&self.individuals, self.config.selection)?;
        let size = self.individuals.len();
        let pool = selector.pool_len();
        let mut next = Vec::with_capacity(size);

        if self.config.elitism {
            if let Some(best) = self.best() {
                debug!(fitness = best.fitness, "Carrying over elite individual");
                next.push(Individual::new(best.genome.clone()));
            }
        }

        while next.len() < size {
            let parent1 = selector.select(rng);
            let parent2 = selector.select(rng);
            let child = self
                .breeder
                .crossover_and_mutate(&parent1.genome, &parent2.genome, rng);
            next.push(Individual::new(child));
        }

        self.individuals = next;
        self.generation += 1;

        debug!(size, pool, "Created new generation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Genome;
    use evo_core::{Alphabet, Direction, SelectionPolicy};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config(num_individuals: usize, gene_length: usize) -> GeneticConfig {
        GeneticConfig {
            num_individuals,
            gene_length,
            ..Default::default()
        }
    }

    #[test]
    fn test_population_creation() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let population = Population::new(config(30, 15), &mut rng).unwrap();

        assert_eq!(population.len(), 30);
        assert!(population
            .individuals()
            .iter()
            .all(|ind| ind.genome.len() == 15 && ind.fitness == 0));
    }

    #[test]
    fn test_invalid_configuration() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(matches!(
            Population::new(config(0, 10), &mut rng),
            Err(Error::InvalidConfiguration(_))
        ));

        let truncation = GeneticConfig {
            selection: SelectionPolicy::Truncation { top_fraction: 0.15 },
            ..config(4, 10)
        };
        assert!(matches!(
            Population::new(truncation, &mut rng),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_from_individuals_checks_length() {
        let individuals = vec![Individual::new(Genome::new(vec![Direction::Up; 3]))];
        assert!(Population::from_individuals(config(1, 4), individuals.clone()).is_err());

        let population = Population::from_individuals(config(99, 3), individuals).unwrap();
        assert_eq!(population.len(), 1);
    }

    #[test]
    fn test_stats() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut population = Population::new(config(4, 5), &mut rng).unwrap();
        population.assign_fitness(&[4, 0, 2, 2]).unwrap();

        let stats = population.stats().unwrap();
        assert_eq!(stats.max, 4);
        assert_eq!(stats.min, 0);
        assert!((stats.mean - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_assign_fitness_length_mismatch() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut population = Population::new(config(3, 5), &mut rng).unwrap();
        assert!(matches!(
            population.assign_fitness(&[1, 2]),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_best_prefers_first_on_ties() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut population = Population::new(config(3, 5), &mut rng).unwrap();
        population.assign_fitness(&[1, 5, 5]).unwrap();
        assert_eq!(population.best(), Some(&population.individuals()[1]));
    }

    #[test]
    fn test_new_generation_resets_fitness() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut population = Population::new(config(20, 8), &mut rng).unwrap();
        let fitness: Vec<u32> = (0..20).collect();
        population.assign_fitness(&fitness).unwrap();

        population.create_new_generation(&mut rng).unwrap();

        assert_eq!(population.len(), 20);
        assert!(population.individuals().iter().all(|ind| ind.fitness == 0));
    }

    #[test]
    fn test_elitism_keeps_best_genome() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let elitist = GeneticConfig {
            elitism: true,
            mutation_threshold: 0.5,
            ..config(10, 30)
        };
        let mut population = Population::new(elitist, &mut rng).unwrap();
        let fitness = [0, 1, 2, 3, 9, 3, 2, 1, 0, 0];
        population.assign_fitness(&fitness).unwrap();
        let champion = population.individuals()[4].genome.clone();

        population.create_new_generation(&mut rng).unwrap();

        assert_eq!(population.individuals()[0].genome, champion);
        assert_eq!(population.individuals()[0].fitness, 0);
        assert_eq!(population.len(), 10);
    }

    #[test]
    fn test_selection_pressure_spreads_fit_genome() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let winner = Genome::new(vec![Direction::Right; 10]);
        let mut individuals: Vec<Individual> = (0..50)
            .map(|_| Individual::new(Genome::new(vec![Direction::Left; 10])))
            .collect();
        individuals[17] = Individual {
            genome: winner.clone(),
            fitness: 10,
        };

        let truncation = GeneticConfig {
            selection: SelectionPolicy::Truncation { top_fraction: 0.03 },
            mutation_threshold: 0.0,
            ..config(50, 10)
        };
        let mut population = Population::from_individuals(truncation, individuals).unwrap();
        population.create_new_generation(&mut rng).unwrap();

        // A pool of one means both parents are the winner
        assert!(population
            .individuals()
            .iter()
            .all(|ind| ind.genome == winner));
    }

    #[test]
    fn test_deterministic_with_seed() {
        let run = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut population = Population::new(config(16, 12), &mut rng).unwrap();
            for round in 0..5u32 {
                let fitness: Vec<u32> = (0..16u32).map(|i| (i * 7 + round) % 13).collect();
                population.assign_fitness(&fitness).unwrap();
                population.create_new_generation(&mut rng).unwrap();
            }
            population.individuals().to_vec()
        };

        assert_eq!(run(99), run(99));
        assert_ne!(run(99), run(100));
    }

    proptest! {
        #[test]
        fn prop_size_and_length_are_stable(
            seed in any::<u64>(),
            num_individuals in 1usize..40,
            gene_length in 1usize..30,
            generations in 1usize..5,
            extended in any::<bool>(),
            elitism in any::<bool>(),
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let config = GeneticConfig {
                num_individuals,
                gene_length,
                alphabet: if extended { Alphabet::Extended } else { Alphabet::Orthogonal },
                elitism,
                ..Default::default()
            };
            let mut population = Population::new(config, &mut rng).unwrap();

            for _ in 0..generations {
                let fitness: Vec<u32> = (0..num_individuals)
                    .map(|_| rng.gen_range(0..=gene_length as u32))
                    .collect();
                population.assign_fitness(&fitness).unwrap();
                population.create_new_generation(&mut rng).unwrap();

                prop_assert_eq!(population.len(), num_individuals);
                for ind in population.individuals() {
                    prop_assert_eq!(ind.genome.len(), gene_length);
                }
            }
        }
    }
}
