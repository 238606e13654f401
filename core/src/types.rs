//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds on the run's monotonic timeline. Every timer in the core is a
/// comparison between stored timestamps and a freshly sampled one.
pub type Timestamp = f64;

/// A simulation tick counter. One tick = one engine poll.
pub type Tick = u64;

/// Unique key of a plant archetype within a run.
pub type ArchetypeName = String;

/// The canonical run identifier.
pub type RunId = String;

/// A cell on the garden grid, `(col, row)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub col: u32,
    pub row: u32,
}

impl GridPos {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}
