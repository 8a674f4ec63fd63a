//! Board cells.
//!
//! A `Cell` is a `(row, col)` pair of integers. It is the key type for
//! occupancy maps and the coordinate unit of every command parameter.

use serde::{Deserialize, Serialize};

/// A board cell as `(row, col)`.
///
/// Value type: compared by value, hashable, used as a map key.
/// Coordinates may be negative during delta arithmetic; only the board
/// decides what is in bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    /// Create a cell from row and column.
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// The `(d_row, d_col)` delta that moves `from` onto `self`.
    #[must_use]
    pub const fn delta_from(self, from: Cell) -> (i32, i32) {
        (self.row - from.row, self.col - from.col)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}
