//! Text rendering of the grid and the best creature's walk.

use evo_core::{GenerationStats, Position, Tile};
use evo_genetics::Population;
use evo_world::{trace, GenerationObserver, Grid};
use std::collections::HashSet;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Draws a frame every `interval` generations
pub struct TextRenderer {
    interval: u64,
    delay: Option<Duration>,
}

impl TextRenderer {
    pub fn new(interval: u64, delay_ms: Option<u64>) -> Self {
        Self {
            interval: interval.max(1),
            delay: delay_ms.map(Duration::from_millis),
        }
    }
}

/// `#` wall, `*` point, `o` trail, `@` where the walk ended, `S` start
pub fn render_frame(grid: &Grid, path: &[Position]) -> String {
    let trail: HashSet<Position> = path.iter().copied().collect();
    let start = path.first().copied();
    let end = path.last().copied();

    let mut frame = String::with_capacity(((grid.width + 1) * grid.height) as usize);
    for y in 0..grid.height {
        for x in 0..grid.width {
            let pos = Position::new(x, y);
            let c = if Some(pos) == end {
                '@'
            } else if Some(pos) == start {
                'S'
            } else if trail.contains(&pos) {
                'o'
            } else {
                match grid.tile_at(pos) {
                    Tile::Wall => '#',
                    Tile::Point => '*',
                    Tile::Empty => '.',
                }
            };
            frame.push(c);
        }
        frame.push('\n');
    }
    frame
}

impl GenerationObserver for TextRenderer {
    fn on_generation(&mut self, stats: &GenerationStats, population: &Population, grid: &Grid) {
        if stats.generation % self.interval != 0 {
            return;
        }
        let Some(best) = population.best() else {
            return;
        };

        let frame = render_frame(grid, &trace(&best.genome, grid));
        let mut out = io::stdout().lock();
        let written = writeln!(
            out,
            "generation {}  max {}  min {}  mean {:.2}\n{}",
            stats.generation, stats.max, stats.min, stats.mean, frame
        )
        .and_then(|_| out.flush());

        if let Err(e) = written {
            warn!("Failed to draw frame: {}", e);
        }

        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
    }
}
