//! Command-line arguments and their mapping onto the run configuration.

use anyhow::{Context, Result};
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use evo_core::{Alphabet, Boundary, GridConfig, GridLayout, SelectionPolicy, SimulationConfig};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "evo-cli")]
#[command(about = "Evolve creatures that collect points on a grid level")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the genetic algorithm
    Run(RunArgs),
    /// Generate a level and write it to a file
    NewLevel(NewLevelArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutArg {
    Empty,
    Boxed,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryArg {
    Wrap,
    Clamp,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionArg {
    Tournament,
    Truncation,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlphabetArg {
    Orthogonal,
    Extended,
}

#[derive(Args, Debug, Default)]
pub struct GridArgs {
    /// Grid columns
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..))]
    pub width: Option<i32>,

    /// Grid rows
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..))]
    pub height: Option<i32>,

    /// Layout of a generated grid
    #[arg(long, value_enum)]
    pub layout: Option<LayoutArg>,

    /// Chance for each empty tile to hold a point (0.0 to 1.0)
    #[arg(long)]
    pub point_frequency: Option<f64>,

    /// Edge behaviour
    #[arg(long, value_enum)]
    pub boundary: Option<BoundaryArg>,
}

impl GridArgs {
    fn apply(&self, grid: &mut GridConfig) {
        if let Some(width) = self.width {
            grid.width = width;
        }
        if let Some(height) = self.height {
            grid.height = height;
        }
        if let Some(layout) = self.layout {
            grid.layout = match layout {
                LayoutArg::Empty => GridLayout::Empty,
                LayoutArg::Boxed => GridLayout::Boxed,
            };
        }
        if let Some(frequency) = self.point_frequency {
            grid.point_frequency = frequency;
        }
        if let Some(boundary) = self.boundary {
            grid.boundary = match boundary {
                BoundaryArg::Wrap => Boundary::Wrap,
                BoundaryArg::Clamp => Boundary::Clamp,
            };
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// JSON configuration file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of generations (default: 250)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub generations: Option<u64>,

    /// Number of creatures (default: 100)
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub population: Option<usize>,

    /// Number of moves per creature (default: 100)
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub moves: Option<usize>,

    /// Generations between progress reports (default: 10)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub report_interval: Option<u64>,

    /// Draw the best creature every N generations
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub render_interval: Option<u64>,

    /// Pause after each drawn frame, in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub render_delay_ms: Option<u64>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Level file to run on (.json or binary); otherwise a grid is generated
    #[arg(long)]
    pub level: Option<PathBuf>,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Parent selection strategy
    #[arg(long, value_enum)]
    pub selection: Option<SelectionArg>,

    /// Creatures per tournament (default: 5)
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub tournament_size: Option<usize>,

    /// Share of the population kept as the mating pool (default: 0.15)
    #[arg(long)]
    pub top_fraction: Option<f64>,

    /// Carry the best creature unchanged into the next generation
    #[arg(long)]
    pub elitism: bool,

    /// Per-gene chance of a random move (default: 0.02)
    #[arg(long)]
    pub mutation_threshold: Option<f64>,

    /// Move set
    #[arg(long, value_enum)]
    pub alphabet: Option<AlphabetArg>,

    /// Initial genomes never undo their previous move
    #[arg(long)]
    pub avoid_backtracking: bool,

    /// Evaluate creatures on all cores
    #[arg(long)]
    pub parallel: bool,

    /// Write the run report as JSON
    #[arg(long)]
    pub stats_out: Option<PathBuf>,
}

const DEFAULT_TOURNAMENT_SIZE: usize = 5;
const DEFAULT_TOP_FRACTION: f64 = 0.15;

impl RunArgs {
    /// Configuration file (or defaults) with flags applied, validated
    pub fn to_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("failed to parse config {}", path.display()))?
            }
            None => SimulationConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(generations) = self.generations {
            config.run.generations = generations;
        }
        if let Some(interval) = self.report_interval {
            config.run.report_interval = interval;
        }
        if self.parallel {
            config.run.parallel = true;
        }

        self.grid.apply(&mut config.grid);

        let genetics = &mut config.genetics;
        if let Some(population) = self.population {
            genetics.num_individuals = population;
        }
        if let Some(moves) = self.moves {
            genetics.gene_length = moves;
        }
        if let Some(threshold) = self.mutation_threshold {
            genetics.mutation_threshold = threshold;
        }
        if let Some(alphabet) = self.alphabet {
            genetics.alphabet = match alphabet {
                AlphabetArg::Orthogonal => Alphabet::Orthogonal,
                AlphabetArg::Extended => Alphabet::Extended,
            };
        }
        if self.elitism {
            genetics.elitism = true;
        }
        if self.avoid_backtracking {
            genetics.avoid_backtracking = true;
        }
        genetics.selection = self.selection_policy(genetics.selection);

        config.validate()?;
        Ok(config)
    }

    fn selection_policy(&self, current: SelectionPolicy) -> SelectionPolicy {
        let kind = self.selection.unwrap_or(match current {
            SelectionPolicy::Tournament { .. } => SelectionArg::Tournament,
            SelectionPolicy::Truncation { .. } => SelectionArg::Truncation,
        });

        match (kind, current) {
            (SelectionArg::Tournament, SelectionPolicy::Tournament { size }) => {
                SelectionPolicy::Tournament {
                    size: self.tournament_size.unwrap_or(size),
                }
            }
            (SelectionArg::Tournament, _) => SelectionPolicy::Tournament {
                size: self.tournament_size.unwrap_or(DEFAULT_TOURNAMENT_SIZE),
            },
            (SelectionArg::Truncation, SelectionPolicy::Truncation { top_fraction }) => {
                SelectionPolicy::Truncation {
                    top_fraction: self.top_fraction.unwrap_or(top_fraction),
                }
            }
            (SelectionArg::Truncation, _) => SelectionPolicy::Truncation {
                top_fraction: self.top_fraction.unwrap_or(DEFAULT_TOP_FRACTION),
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct NewLevelArgs {
    /// Destination file (.json or binary)
    #[arg(long)]
    pub out: PathBuf,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Random seed for point placement
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

impl NewLevelArgs {
    pub fn to_grid_config(&self) -> Result<GridConfig> {
        let mut grid = GridConfig::default();
        self.grid.apply(&mut grid);
        grid.validate()?;
        Ok(grid)
    }
}
