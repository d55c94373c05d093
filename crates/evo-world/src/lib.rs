//! Grid world and run loop.
//!
//! Creatures replay their genomes on a static tile grid, collecting points
//! and bumping into walls. The run loop evaluates every individual, writes
//! the scores back and asks the population to breed the next generation.

pub mod agent;
pub mod grid;
pub mod level;
pub mod simulation;

pub use agent::{evaluate, trace, Agent};
pub use grid::Grid;
pub use simulation::{GenerationObserver, NoopObserver, RunOutcome, RunReport, Simulation};
