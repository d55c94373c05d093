//! Generation-stepped run loop.

use crate::agent::evaluate;
use crate::grid::Grid;
use chrono::{DateTime, Utc};
use evo_core::{GenerationStats, Result, RunId, SimulationConfig};
use evo_genetics::{Individual, Population};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Called after each generation has been evaluated, before breeding
pub trait GenerationObserver {
    fn on_generation(&mut self, stats: &GenerationStats, population: &Population, grid: &Grid);
}

impl<F> GenerationObserver for F
where
    F: FnMut(&GenerationStats, &Population, &Grid),
{
    fn on_generation(&mut self, stats: &GenerationStats, population: &Population, grid: &Grid) {
        self(stats, population, grid)
    }
}

/// Observer that ignores every generation
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {
    fn on_generation(&mut self, _: &GenerationStats, _: &Population, _: &Grid) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    /// Stopped early on request; statistics cover the generations that ran
    Cancelled,
}

/// Everything a run produced, in generation order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: RunOutcome,
    pub history: Vec<GenerationStats>,
    /// Fittest individual seen in any generation
    pub best: Option<Individual>,
}

impl RunReport {
    pub fn is_cancelled(&self) -> bool {
        self.outcome == RunOutcome::Cancelled
    }

    pub fn last(&self) -> Option<&GenerationStats> {
        self.history.last()
    }
}

pub struct Simulation {
    run_id: RunId,
    grid: Grid,
    population: Population,
    config: SimulationConfig,
    rng: ChaCha8Rng,
}

impl Simulation {
    /// Run on a caller-supplied grid as is; only `config.grid.boundary`
    /// is applied to it
    pub fn new(config: SimulationConfig, grid: Grid) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let grid = grid.with_boundary(config.grid.boundary);
        Self::build(config, grid, rng)
    }

    /// Run on a grid generated from `config.grid`
    pub fn from_config(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let grid = Grid::from_config(&config.grid, &mut rng)?;
        Self::build(config, grid, rng)
    }

    /// Run on a loaded level: points are scattered over its empty tiles and
    /// the configured boundary applies
    pub fn from_level(config: SimulationConfig, mut level: Grid) -> Result<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        level.scatter_points(config.grid.point_frequency, &mut rng);
        let grid = level.with_boundary(config.grid.boundary);
        Self::build(config, grid, rng)
    }

    fn build(config: SimulationConfig, grid: Grid, mut rng: ChaCha8Rng) -> Result<Self> {
        grid.validate()?;
        let population = Population::new(config.genetics.clone(), &mut rng)?;
        let run_id = RunId::new();

        debug!(
            run_id = %run_id,
            width = grid.width,
            height = grid.height,
            individuals = population.len(),
            "Simulation created"
        );

        Ok(Self {
            run_id,
            grid,
            population,
            config,
            rng,
        })
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Scores for every individual, in population order
    pub fn evaluate_population(&self) -> Vec<u32> {
        let individuals = self.population.individuals();
        if self.config.run.parallel {
            individuals
                .par_iter()
                .map(|ind| evaluate(&ind.genome, &self.grid))
                .collect()
        } else {
            individuals
                .iter()
                .map(|ind| evaluate(&ind.genome, &self.grid))
                .collect()
        }
    }

    /// Evaluate the current generation and write the scores back
    pub fn evaluate_generation(&mut self, generation: u64) -> Result<GenerationStats> {
        let fitness = self.evaluate_population();
        self.population.assign_fitness(&fitness)?;
        let stats = self.population.stats()?;
        Ok(GenerationStats::new(generation, stats))
    }

    /// Evolve for the configured number of generations.
    ///
    /// The token is checked once per generation; a cancelled run returns the
    /// statistics gathered so far.
    #[instrument(skip_all, fields(run_id = %self.run_id, generations = self.config.run.generations))]
    pub fn run(
        &mut self,
        cancel: &CancellationToken,
        observer: &mut dyn GenerationObserver,
    ) -> Result<RunReport> {
        let started_at = Utc::now();
        let generations = self.config.run.generations;
        let report_interval = self.config.run.report_interval;

        info!("Starting run for {} generations", generations);

        let mut history = Vec::with_capacity(generations as usize);
        let mut best: Option<Individual> = None;
        let mut outcome = RunOutcome::Completed;

        for generation in 0..generations {
            if cancel.is_cancelled() {
                warn!(generation, "Run cancelled, returning partial statistics");
                outcome = RunOutcome::Cancelled;
                break;
            }

            let stats = self.evaluate_generation(generation)?;
            history.push(stats);

            if let Some(champion) = self.population.best() {
                if best.as_ref().map_or(true, |b| champion.fitness > b.fitness) {
                    best = Some(champion.clone());
                }
            }

            if generation % report_interval == 0 || generation + 1 == generations {
                info!(
                    generation,
                    max_fitness = stats.max,
                    min_fitness = stats.min,
                    mean_fitness = stats.mean,
                    "Generation {}/{}",
                    generation + 1,
                    generations
                );
            }

            observer.on_generation(&stats, &self.population, &self.grid);

            if generation + 1 < generations {
                self.population.create_new_generation(&mut self.rng)?;
            }
        }

        let report = RunReport {
            run_id: self.run_id,
            seed: self.config.seed,
            started_at,
            finished_at: Utc::now(),
            outcome,
            history,
            best,
        };
        self.emit_run_summary(&report);

        Ok(report)
    }

    fn emit_run_summary(&self, report: &RunReport) {
        let best_fitness = report.best.as_ref().map(|b| b.fitness).unwrap_or(0);
        let elapsed_ms = (report.finished_at - report.started_at).num_milliseconds();

        info!(
            event = "run_summary",
            outcome = ?report.outcome,
            generations_completed = report.history.len(),
            best_fitness,
            final_mean_fitness = report.last().map(|s| s.mean).unwrap_or(0.0),
            elapsed_ms,
            "Run finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evo_core::{GeneticConfig, GridConfig, GridLayout, RunConfig, SelectionPolicy, Tile};

    fn small_config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed,
            grid: GridConfig {
                width: 30,
                height: 20,
                layout: GridLayout::Boxed,
                point_frequency: 0.2,
                ..Default::default()
            },
            genetics: GeneticConfig {
                num_individuals: 24,
                gene_length: 40,
                ..Default::default()
            },
            run: RunConfig {
                generations: 8,
                report_interval: 2,
                parallel: false,
            },
        }
    }

    #[test]
    fn test_run_produces_one_stat_per_generation() {
        let mut sim = Simulation::from_config(small_config(1)).unwrap();
        let report = sim.run(&CancellationToken::new(), &mut NoopObserver).unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.history.len(), 8);
        for (i, stats) in report.history.iter().enumerate() {
            assert_eq!(stats.generation, i as u64);
            assert!(stats.min <= stats.max);
            assert!(stats.max <= 40);
            assert!(stats.mean >= stats.min as f64 && stats.mean <= stats.max as f64);
        }
        assert_eq!(sim.population().len(), 24);
    }

    #[test]
    fn test_population_invariants_hold_every_generation() {
        let mut sim = Simulation::from_config(small_config(2)).unwrap();
        let mut observer = |stats: &GenerationStats, population: &Population, _: &Grid| {
            assert_eq!(population.len(), 24);
            assert!(population
                .individuals()
                .iter()
                .all(|ind| ind.genome.len() == 40 && ind.fitness <= 40));
            assert!(stats.max <= 40);
        };
        sim.run(&CancellationToken::new(), &mut observer).unwrap();
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |parallel: bool| {
            let mut config = small_config(77);
            config.run.parallel = parallel;
            let mut sim = Simulation::from_config(config).unwrap();
            let report = sim.run(&CancellationToken::new(), &mut NoopObserver).unwrap();
            (
                report.history,
                report.best,
                sim.population().individuals().to_vec(),
            )
        };

        let first = run(false);
        assert_eq!(first, run(false));
        assert_eq!(first, run(true));
    }

    #[test]
    fn test_cancel_before_start() {
        let token = CancellationToken::new();
        token.cancel();

        let mut sim = Simulation::from_config(small_config(3)).unwrap();
        let report = sim.run(&token, &mut NoopObserver).unwrap();

        assert!(report.is_cancelled());
        assert!(report.history.is_empty());
        assert!(report.best.is_none());
    }

    #[test]
    fn test_cancel_mid_run_keeps_partial_history() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let mut observer = |stats: &GenerationStats, _: &Population, _: &Grid| {
            if stats.generation == 2 {
                trigger.cancel();
            }
        };

        let mut sim = Simulation::from_config(small_config(4)).unwrap();
        let report = sim.run(&token, &mut observer).unwrap();

        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.history.len(), 3);
        assert!(report.best.is_some());
    }

    #[test]
    fn test_elitism_never_loses_ground() {
        let mut config = small_config(5);
        config.genetics.elitism = true;
        config.run.generations = 15;

        let mut sim = Simulation::from_config(config).unwrap();
        let report = sim.run(&CancellationToken::new(), &mut NoopObserver).unwrap();

        for pair in report.history.windows(2) {
            assert!(pair[1].max >= pair[0].max);
        }
    }

    #[test]
    fn test_truncation_run() {
        let mut config = small_config(6);
        config.genetics.selection = SelectionPolicy::Truncation { top_fraction: 0.2 };

        let mut sim = Simulation::from_config(config).unwrap();
        let report = sim.run(&CancellationToken::new(), &mut NoopObserver).unwrap();
        assert_eq!(report.history.len(), 8);
    }

    #[test]
    fn test_supplied_grid_without_points() {
        let grid = Grid::boxed(10, 5);
        let mut sim = Simulation::new(small_config(8), grid).unwrap();
        let report = sim.run(&CancellationToken::new(), &mut NoopObserver).unwrap();

        assert_eq!(sim.grid().count(Tile::Point), 0);
        assert!(report.history.iter().all(|s| s.max == 0 && s.mean == 0.0));
    }

    #[test]
    fn test_level_gets_points_and_boundary() {
        let mut config = small_config(11);
        config.grid.point_frequency = 1.0;
        config.grid.boundary = evo_core::Boundary::Clamp;

        let sim = Simulation::from_level(config, Grid::boxed(10, 5)).unwrap();
        assert_eq!(sim.grid().count(Tile::Point), 8 * 3);
        assert_eq!(sim.grid().boundary(), evo_core::Boundary::Clamp);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = small_config(9);
        config.run.report_interval = 0;
        assert!(Simulation::from_config(config).is_err());

        let mut config = small_config(9);
        config.genetics.num_individuals = 3;
        config.genetics.selection = SelectionPolicy::Truncation { top_fraction: 0.1 };
        assert!(Simulation::new(config, Grid::empty(5, 5)).is_err());
    }

    #[test]
    fn test_rejects_degenerate_grids() {
        assert!(matches!(
            Simulation::new(small_config(12), Grid::empty(0, 0)),
            Err(evo_core::Error::InvalidConfiguration(_))
        ));
        assert!(Simulation::new(small_config(12), Grid::empty(7, 0)).is_err());
        assert!(Simulation::from_level(small_config(12), Grid::empty(0, 4)).is_err());

        let mut config = small_config(12);
        config.grid.width = 65_536;
        config.grid.height = 32_769;
        assert!(Simulation::from_config(config).is_err());
    }

    #[test]
    fn test_supplied_grid_takes_configured_boundary() {
        let mut config = small_config(13);
        config.grid.boundary = evo_core::Boundary::Clamp;

        let sim = Simulation::new(config, Grid::boxed(10, 5)).unwrap();
        assert_eq!(sim.grid().boundary(), evo_core::Boundary::Clamp);
    }

    #[test]
    fn test_report_serializes() {
        let mut sim = Simulation::from_config(small_config(10)).unwrap();
        let report = sim.run(&CancellationToken::new(), &mut NoopObserver).unwrap();

        let json = serde_json::to_string(&report).unwrap();
        let restored: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.history, report.history);
        assert_eq!(restored.run_id, report.run_id);
    }
}
