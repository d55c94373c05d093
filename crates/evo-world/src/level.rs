//! Level persistence.
//!
//! A level is stored as its column-major tile codes (0 empty, 1 wall,
//! 2 point); dimensions follow from the array shape. Binary files are a
//! versioned bincode envelope, `.json` files hold the bare column array.

use crate::grid::Grid;
use evo_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

pub const LEVEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct LevelFile {
    version: u32,
    columns: Vec<Vec<u8>>,
}

pub fn save(grid: &Grid) -> Result<Vec<u8>> {
    let level = LevelFile {
        version: LEVEL_FORMAT_VERSION,
        columns: grid.to_columns(),
    };
    bincode::serialize(&level)
        .map_err(|e| Error::Serialization(format!("Failed to serialize level: {}", e)))
}

pub fn load(bytes: &[u8]) -> Result<Grid> {
    let level: LevelFile = bincode::deserialize(bytes)
        .map_err(|e| Error::Serialization(format!("Failed to deserialize level: {}", e)))?;

    if level.version != LEVEL_FORMAT_VERSION {
        return Err(Error::Serialization(format!(
            "unsupported level format version {} (expected {})",
            level.version, LEVEL_FORMAT_VERSION
        )));
    }

    Grid::from_columns(&level.columns)
}

pub fn save_json(grid: &Grid) -> Result<String> {
    Ok(serde_json::to_string(&grid.to_columns())?)
}

pub fn load_json(text: &str) -> Result<Grid> {
    let columns: Vec<Vec<u8>> = serde_json::from_str(text)?;
    Grid::from_columns(&columns)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Read a level file, choosing the format from the extension
pub fn read_level(path: impl AsRef<Path>) -> Result<Grid> {
    let path = path.as_ref();
    let grid = if is_json(path) {
        load_json(&fs::read_to_string(path)?)?
    } else {
        load(&fs::read(path)?)?
    };

    info!(
        "Loaded level {:?} ({}x{})",
        path, grid.width, grid.height
    );
    Ok(grid)
}

/// Write a level file, choosing the format from the extension
pub fn write_level(path: impl AsRef<Path>, grid: &Grid) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if is_json(path) {
        fs::write(path, save_json(grid)?)?;
    } else {
        fs::write(path, save(grid)?)?;
    }

    info!("Level written to {:?}", path);
    Ok(())
}
