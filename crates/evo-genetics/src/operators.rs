//! Crossover and mutation operators.

use crate::genome::Genome;
use evo_core::{Alphabet, GeneticConfig};
use rand::Rng;

/// Produces children from pairs of parents
#[derive(Debug, Clone)]
pub struct Breeder {
    mutation_threshold: f64,
    crossover_threshold: f64,
    alphabet: Alphabet,
}

impl Breeder {
    pub fn new(config: &GeneticConfig) -> Self {
        Self {
            mutation_threshold: config.mutation_threshold,
            crossover_threshold: config.crossover_threshold(),
            alphabet: config.alphabet,
        }
    }

    /// Builds a child gene by gene.
    ///
    /// For each position one roll `r` in `[0, 1)` decides the source: a fresh
    /// random move when `r <= mutation_threshold`, parent 1 when
    /// `r <= crossover_threshold`, parent 2 otherwise. Both parents must have
    /// the same length.
    pub fn crossover_and_mutate<R: Rng + ?Sized>(
        &self,
        parent1: &Genome,
        parent2: &Genome,
        rng: &mut R,
    ) -> Genome {
        debug_assert_eq!(parent1.len(), parent2.len());

        parent1
            .iter()
            .zip(parent2.iter())
            .map(|(gene1, gene2)| {
                let roll = rng.gen::<f64>();
                if roll <= self.mutation_threshold {
                    self.alphabet.sample(rng)
                } else if roll <= self.crossover_threshold {
                    gene1
                } else {
                    gene2
                }
            })
            .collect()
    }
}
