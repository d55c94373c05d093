//! Fitness statistics tracking.

use serde::{Deserialize, Serialize};

/// Summary of one population's fitness values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessStats {
    pub max: u32,
    pub min: u32,
    pub mean: f64,
}

impl FitnessStats {
    /// Single pass over the values; `None` when there are none
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut iter = values.into_iter();
        let first = iter.next()?;

        let mut max = first;
        let mut min = first;
        let mut total = first as u64;
        let mut count = 1u64;

        for value in iter {
            max = max.max(value);
            min = min.min(value);
            total += value as u64;
            count += 1;
        }

        Some(Self {
            max,
            min,
            mean: total as f64 / count as f64,
        })
    }
}

/// Fitness statistics for one generation, in the order they are produced
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: u64,
    pub max: u32,
    pub min: u32,
    pub mean: f64,
}

impl GenerationStats {
    pub fn new(generation: u64, stats: FitnessStats) -> Self {
        Self {
            generation,
            max: stats.max,
            min: stats.min,
            mean: stats.mean,
        }
    }
}
