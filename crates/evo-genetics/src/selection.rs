//! Parent selection.

use crate::genome::Individual;
use evo_core::{Error, Result, SelectionPolicy};
use rand::Rng;

enum Strategy {
    Tournament { size: usize },
    /// Indices of the mating pool, fittest first
    Truncation { pool: Vec<usize> },
}

/// Picks parents from one generation's evaluated individuals
pub struct Selector<'a> {
    individuals: &'a [Individual],
    strategy: Strategy,
}

impl<'a> Selector<'a> {
    pub fn new(individuals: &'a [Individual], policy: SelectionPolicy) -> Result<Self> {
        if individuals.is_empty() {
            return Err(Error::InvalidState(
                "cannot select from an empty population".to_string(),
            ));
        }
        policy.validate(individuals.len())?;

        let strategy = match policy {
            SelectionPolicy::Tournament { size } => Strategy::Tournament { size },
            SelectionPolicy::Truncation { .. } => {
                let mut order: Vec<usize> = (0..individuals.len()).collect();
                // Stable sort keeps earlier individuals first among equals
                order.sort_by(|&a, &b| individuals[b].fitness.cmp(&individuals[a].fitness));
                order.truncate(policy.pool_size(individuals.len()));
                Strategy::Truncation { pool: order }
            }
        };

        Ok(Self {
            individuals,
            strategy,
        })
    }

    /// Index of the next parent
    pub fn select_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        match &self.strategy {
            Strategy::Tournament { size } => {
                let mut best = rng.gen_range(0..self.individuals.len());
                for _ in 1..*size {
                    let contender = rng.gen_range(0..self.individuals.len());
                    if self.individuals[contender].fitness > self.individuals[best].fitness {
                        best = contender;
                    }
                }
                best
            }
            Strategy::Truncation { pool } => pool[rng.gen_range(0..pool.len())],
        }
    }

    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> &'a Individual {
        &self.individuals[self.select_index(rng)]
    }

    /// Number of individuals a parent can come from
    pub fn pool_len(&self) -> usize {
        match &self.strategy {
            Strategy::Tournament { .. } => self.individuals.len(),
            Strategy::Truncation { pool } => pool.len(),
        }
    }
}
