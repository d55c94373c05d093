//! Creature state while a genome is replayed.

use crate::grid::Grid;
use evo_core::{Direction, Position, Tile};
use evo_genetics::Genome;
use std::collections::HashSet;

/// A creature walking the grid for one evaluation
#[derive(Debug, Clone)]
pub struct Agent {
    position: Position,
    points: u32,
    collected: HashSet<Position>,
}

impl Agent {
    /// The start tile counts as already visited, so a point placed there
    /// never scores.
    pub fn new(position: Position) -> Self {
        let mut collected = HashSet::new();
        collected.insert(position);

        Self {
            position,
            points: 0,
            collected,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    /// Tries one move. Walls absorb the move; an unseen point scores once.
    pub fn step(&mut self, direction: Direction, grid: &Grid) {
        let target = grid.neighbor(self.position, direction);

        match grid.tile_at(target) {
            Tile::Wall => {}
            Tile::Empty => self.position = target,
            Tile::Point => {
                self.position = target;
                if self.collected.insert(target) {
                    self.points += 1;
                }
            }
        }
    }
}

/// Points collected by replaying `genome` from the grid centre
pub fn evaluate(genome: &Genome, grid: &Grid) -> u32 {
    let mut agent = Agent::new(grid.centre());
    for direction in genome.iter() {
        agent.step(direction, grid);
    }
    agent.points()
}

/// Every position the creature occupies, starting with the centre
pub fn trace(genome: &Genome, grid: &Grid) -> Vec<Position> {
    let mut agent = Agent::new(grid.centre());
    let mut path = Vec::with_capacity(genome.len() + 1);
    path.push(agent.position());

    for direction in genome.iter() {
        agent.step(direction, grid);
        path.push(agent.position());
    }

    path
}
