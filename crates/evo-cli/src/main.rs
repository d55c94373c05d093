//! Command-line front end for the genetic level solver.

mod cli;
mod render;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, NewLevelArgs, RunArgs};
use evo_core::Tile;
use evo_world::{level, Grid, NoopObserver, RunReport, Simulation};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use render::TextRenderer;
use std::fs;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize telemetry
    telemetry::init_telemetry(cli.json_logs)?;

    match cli.command {
        Command::Run(args) => run(args).await,
        Command::NewLevel(args) => new_level(args),
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let config = args.to_config()?;

    info!(
        "Starting run: {} generations, {} creatures, {} moves, seed {}",
        config.run.generations,
        config.genetics.num_individuals,
        config.genetics.gene_length,
        config.seed
    );

    let mut simulation = match &args.level {
        Some(path) => {
            let level = level::read_level(path)
                .with_context(|| format!("failed to load level {}", path.display()))?;
            Simulation::from_level(config, level)?
        }
        None => Simulation::from_config(config)?,
    };

    // Stop at the next generation boundary on Ctrl+C / SIGTERM
    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    let renderer = args
        .render_interval
        .map(|interval| TextRenderer::new(interval, args.render_delay_ms));

    let report = tokio::task::spawn_blocking(move || match renderer {
        Some(mut renderer) => simulation.run(&token, &mut renderer),
        None => simulation.run(&token, &mut NoopObserver),
    })
    .await??;

    print_summary(&report);
    if report.is_cancelled() {
        warn!(
            "Run stopped early after {} generations",
            report.history.len()
        );
    }

    if let Some(path) = &args.stats_out {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write statistics to {}", path.display()))?;
        info!("Statistics written to {}", path.display());
    }

    Ok(())
}

fn new_level(args: NewLevelArgs) -> Result<()> {
    let config = args.to_grid_config()?;
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let grid = Grid::from_config(&config, &mut rng)?;

    level::write_level(&args.out, &grid)?;

    println!(
        "Wrote {}x{} level with {} walls and {} points to {}",
        grid.width,
        grid.height,
        grid.count(Tile::Wall),
        grid.count(Tile::Point),
        args.out.display()
    );
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    println!("=== RUN SUMMARY ===");
    println!("  Run:        {}", report.run_id);
    println!("  Seed:       {}", report.seed);
    println!("  Outcome:    {:?}", report.outcome);
    println!("  Generations: {}", report.history.len());

    if let Some(last) = report.last() {
        println!(
            "  Final:      max {}  min {}  mean {:.2}",
            last.max, last.min, last.mean
        );
    }
    if let Some(best) = &report.best {
        println!("  Best:       {} points", best.fitness);
        println!("  Genome:     {}", best.genome);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping after the current generation");
}
