//! 2D tile grid for the world.

use evo_core::{
    validate_grid_dimensions, Boundary, Direction, Error, GridConfig, GridLayout, Position,
    Result, Tile,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A fixed-size grid of tiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    boundary: Boundary,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Empty grid with checked dimensions
    pub fn new(width: i32, height: i32) -> Result<Self> {
        validate_grid_dimensions(width, height)?;
        Ok(Self::empty(width, height))
    }

    pub fn empty(width: i32, height: i32) -> Self {
        let size = (width.max(0) as usize).saturating_mul(height.max(0) as usize);
        Self {
            width,
            height,
            boundary: Boundary::default(),
            tiles: vec![Tile::Empty; size],
        }
    }

    /// Walls along the border, empty inside
    pub fn boxed(width: i32, height: i32) -> Self {
        let mut grid = Self::empty(width, height);
        for y in 0..height {
            for x in 0..width {
                if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                    grid.set(Position::new(x, y), Tile::Wall);
                }
            }
        }
        grid
    }

    /// Grid from a column-major blueprint: `columns[x][y]` holds the tile code
    pub fn from_columns(columns: &[Vec<u8>]) -> Result<Self> {
        let height = columns.first().map(Vec::len).unwrap_or(0);
        if columns.is_empty() || height == 0 {
            return Err(Error::InvalidConfiguration(
                "level blueprint has no tiles".to_string(),
            ));
        }
        if let Some(x) = columns.iter().position(|column| column.len() != height) {
            return Err(Error::InvalidConfiguration(format!(
                "level column {x} has {} rows, expected {height}",
                columns[x].len()
            )));
        }

        let width = i32::try_from(columns.len()).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        let mut grid = Self::new(width, height)?;
        for (x, column) in columns.iter().enumerate() {
            for (y, &code) in column.iter().enumerate() {
                let tile = Tile::from_code(code).ok_or_else(|| {
                    Error::InvalidConfiguration(format!("unknown tile code {code} at ({x}, {y})"))
                })?;
                grid.set(Position::new(x as i32, y as i32), tile);
            }
        }

        Ok(grid)
    }

    /// Create a grid from configuration, scattering points over empty tiles
    pub fn from_config<R: Rng + ?Sized>(config: &GridConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let mut grid = match config.layout {
            GridLayout::Empty => Self::new(config.width, config.height)?,
            GridLayout::Boxed => Self::boxed(config.width, config.height),
        };
        grid.scatter_points(config.point_frequency, rng);

        Ok(grid.with_boundary(config.boundary))
    }

    /// Checks the dimensions and that the tile storage matches them
    pub fn validate(&self) -> Result<()> {
        validate_grid_dimensions(self.width, self.height)?;
        let expected = self.width as usize * self.height as usize;
        if self.tiles.len() != expected {
            return Err(Error::InvalidConfiguration(format!(
                "grid {}x{} holds {} tiles, expected {expected}",
                self.width,
                self.height,
                self.tiles.len()
            )));
        }
        Ok(())
    }

    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Turns each empty tile into a point with probability `chance`
    pub fn scatter_points<R: Rng + ?Sized>(&mut self, chance: f64, rng: &mut R) {
        for tile in &mut self.tiles {
            if *tile == Tile::Empty && rng.gen::<f64>() < chance {
                *tile = Tile::Point;
            }
        }
    }

    /// Tile at position. Outside the grid this wraps, or reads as a wall when clamped
    pub fn tile_at(&self, pos: Position) -> Tile {
        if pos.in_bounds(self.width, self.height) {
            return self.tiles[self.pos_to_index(pos)];
        }
        match self.boundary {
            Boundary::Wrap => self.tiles[self.pos_to_index(pos.wrap(self.width, self.height))],
            Boundary::Clamp => Tile::Wall,
        }
    }

    pub fn tile_at_xy(&self, x: i32, y: i32) -> Tile {
        self.tile_at(Position::new(x, y))
    }

    /// Target of a one-step move from `pos`
    pub fn neighbor(&self, pos: Position, direction: Direction) -> Position {
        let (dx, dy) = direction.to_delta();
        let target = pos.add(dx, dy);
        match self.boundary {
            Boundary::Wrap => target.wrap(self.width, self.height),
            Boundary::Clamp => target,
        }
    }

    /// Where creatures start
    pub fn centre(&self) -> Position {
        Position::new(self.width / 2, self.height / 2)
    }

    /// Set tile at position (wrapped into the grid)
    pub fn set(&mut self, pos: Position, tile: Tile) {
        let wrapped = pos.wrap(self.width, self.height);
        let index = self.pos_to_index(wrapped);
        self.tiles[index] = tile;
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }

    /// Column-major tile codes, the inverse of [`Grid::from_columns`]
    pub fn to_columns(&self) -> Vec<Vec<u8>> {
        (0..self.width)
            .map(|x| {
                (0..self.height)
                    .map(|y| self.tile_at_xy(x, y).code())
                    .collect()
            })
            .collect()
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        pos.y as usize * self.width as usize + pos.x as usize
    }
}
