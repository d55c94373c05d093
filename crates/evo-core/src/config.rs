//! Configuration types for the solver.

use crate::error::{Error, Result};
use crate::types::Alphabet;
use serde::{Deserialize, Serialize};

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::InvalidConfiguration(message()))
    }
}

fn ensure_probability(name: &str, value: f64) -> Result<()> {
    ensure((0.0..=1.0).contains(&value), || {
        format!("{name} must be within [0, 1], got {value}")
    })
}

/// Largest number of tiles a grid may hold
pub const MAX_GRID_TILES: usize = 1 << 24;

/// Both sides at least 1 and the tile count within [`MAX_GRID_TILES`]
pub fn validate_grid_dimensions(width: i32, height: i32) -> Result<()> {
    ensure(width >= 1 && height >= 1, || {
        format!("grid dimensions must be positive, got {width}x{height}")
    })?;
    let tiles = (width as usize).checked_mul(height as usize);
    ensure(tiles.is_some_and(|n| n <= MAX_GRID_TILES), || {
        format!("grid {width}x{height} exceeds {MAX_GRID_TILES} tiles")
    })
}

/// How coordinates behave at the edge of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Leaving one edge re-enters from the opposite edge
    #[default]
    Wrap,
    /// Everything outside the grid reads as wall
    Clamp,
}

/// Starting layout for a generated grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridLayout {
    #[default]
    Empty,
    /// Walls along the border only
    Boxed,
}

/// Grid world configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of columns
    pub width: i32,
    /// Number of rows
    pub height: i32,
    /// Layout used when no level file is supplied
    pub layout: GridLayout,
    /// Chance for each empty tile to become a point (0.0 to 1.0)
    pub point_frequency: f64,
    /// Edge behaviour
    pub boundary: Boundary,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 90,
            height: 50,
            layout: GridLayout::Empty,
            point_frequency: 0.025,
            boundary: Boundary::Wrap,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        validate_grid_dimensions(self.width, self.height)?;
        ensure_probability("point_frequency", self.point_frequency)
    }
}

/// Parent selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Fittest of `size` uniform draws with replacement
    Tournament { size: usize },
    /// Uniform draw from the top `top_fraction` of the sorted population
    Truncation { top_fraction: f64 },
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::Tournament { size: 5 }
    }
}

impl SelectionPolicy {
    /// Number of individuals a truncation pool holds for a population of `population` members
    pub fn pool_size(&self, population: usize) -> usize {
        match self {
            SelectionPolicy::Tournament { .. } => population,
            SelectionPolicy::Truncation { top_fraction } => {
                (population as f64 * top_fraction).floor() as usize
            }
        }
    }

    pub fn validate(&self, population: usize) -> Result<()> {
        match *self {
            SelectionPolicy::Tournament { size } => {
                ensure(size >= 1, || "tournament size must be at least 1".to_string())
            }
            SelectionPolicy::Truncation { top_fraction } => {
                ensure_probability("top_fraction", top_fraction)?;
                ensure(self.pool_size(population) >= 1, || {
                    format!(
                        "truncation pool is empty: {population} individuals x {top_fraction} rounds to 0"
                    )
                })
            }
        }
    }
}

/// Genetic algorithm parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Individuals per generation
    pub num_individuals: usize,
    /// Moves per individual
    pub gene_length: usize,
    /// Directions genes are drawn from
    pub alphabet: Alphabet,
    /// Parent selection strategy
    pub selection: SelectionPolicy,
    /// Per-gene chance of a fresh random direction (0.0 to 1.0)
    pub mutation_threshold: f64,
    /// Carry the best individual unchanged into the next generation
    pub elitism: bool,
    /// Initial genomes never immediately undo their previous move
    pub avoid_backtracking: bool,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            num_individuals: 100,
            gene_length: 100,
            alphabet: Alphabet::Orthogonal,
            selection: SelectionPolicy::default(),
            mutation_threshold: 0.02,
            elitism: false,
            avoid_backtracking: false,
        }
    }
}

impl GeneticConfig {
    /// Upper bound of the parent-1 branch; splits the non-mutation mass evenly
    pub fn crossover_threshold(&self) -> f64 {
        (1.0 + self.mutation_threshold) / 2.0
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.num_individuals >= 1, || {
            "population size must be at least 1".to_string()
        })?;
        ensure(self.gene_length >= 1, || {
            "gene length must be at least 1".to_string()
        })?;
        ensure_probability("mutation_threshold", self.mutation_threshold)?;
        self.selection.validate(self.num_individuals)
    }
}

/// Run loop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of generations to evolve
    pub generations: u64,
    /// Generations between progress reports
    pub report_interval: u64,
    /// Evaluate individuals on the rayon thread pool
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            generations: 250,
            report_interval: 10,
            parallel: false,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        ensure(self.generations >= 1, || {
            "generations must be at least 1".to_string()
        })?;
        ensure(self.report_interval >= 1, || {
            "report interval must be at least 1".to_string()
        })
    }
}

/// Complete configuration for one simulation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    pub grid: GridConfig,
    pub genetics: GeneticConfig,
    pub run: RunConfig,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.genetics.validate()?;
        self.run.validate()
    }
}
