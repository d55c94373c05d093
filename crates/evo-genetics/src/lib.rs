//! Genetic algorithm engine for creature genomes.
//!
//! A genome is a fixed-length list of moves. Each generation is evaluated
//! externally, then the population breeds a replacement generation:
//! - Selection: tournament or truncation, optionally with elitism
//! - Crossover: per-gene choice between two parents
//! - Mutation: per-gene chance of a fresh random move

pub mod genome;
pub mod operators;
pub mod population;
pub mod selection;

pub use genome::{Genome, Individual};
pub use operators::Breeder;
pub use population::Population;
pub use selection::Selector;
