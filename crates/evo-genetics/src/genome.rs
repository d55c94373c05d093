//! Genome and individual types.

use evo_core::{Alphabet, Direction, GeneticConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered list of moves, replayed one per step
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Genome {
    genes: Vec<Direction>,
}

impl Genome {
    pub fn new(genes: Vec<Direction>) -> Self {
        Self { genes }
    }

    /// Independent uniform draws from the alphabet
    pub fn random<R: Rng + ?Sized>(length: usize, alphabet: Alphabet, rng: &mut R) -> Self {
        (0..length).map(|_| alphabet.sample(rng)).collect()
    }

    /// Uniform draws, redrawing any move that would undo the previous one
    pub fn random_non_backtracking<R: Rng + ?Sized>(
        length: usize,
        alphabet: Alphabet,
        rng: &mut R,
    ) -> Self {
        let dirs = alphabet.directions();
        let mut genes = Vec::with_capacity(length);
        let mut previous: Option<usize> = None;

        while genes.len() < length {
            let index = rng.gen_range(0..dirs.len());
            if previous == Some(alphabet.reverse_index(index)) {
                continue;
            }
            previous = Some(index);
            genes.push(dirs[index]);
        }

        Self { genes }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn genes(&self) -> &[Direction] {
        &self.genes
    }

    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        self.genes.iter().copied()
    }
}

impl FromIterator<Direction> for Genome {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        Self {
            genes: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, gene) in self.genes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{gene}")?;
        }
        Ok(())
    }
}

/// One member of a population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub genome: Genome,
    /// Points collected in the last evaluation; 0 until evaluated
    pub fitness: u32,
}

impl Individual {
    pub fn new(genome: Genome) -> Self {
        Self { genome, fitness: 0 }
    }

    /// Random genome drawn according to the config's alphabet and initialisation mode
    pub fn new_random<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> Self {
        let genome = if config.avoid_backtracking {
            Genome::random_non_backtracking(config.gene_length, config.alphabet, rng)
        } else {
            Genome::random(config.gene_length, config.alphabet, rng)
        };
        Self::new(genome)
    }
}
