//! The board: grid dimensions and coordinate conversions.
//!
//! The board knows nothing about pieces. It only converts between cells,
//! real-world metres (the unit physics interpolates in), and pixels (for
//! renderers, which live outside this crate).

use crate::core::Cell;

/// Grid dimensions plus cell ↔ metre ↔ pixel conversion factors.
#[derive(Clone, Debug)]
pub struct Board {
    cell_h_pix: u32,
    cell_w_pix: u32,
    w_cells: i32,
    h_cells: i32,
    cell_h_m: f64,
    cell_w_m: f64,
}

impl Board {
    /// Create a board with cells one metre square.
    #[must_use]
    pub fn new(cell_h_pix: u32, cell_w_pix: u32, w_cells: i32, h_cells: i32) -> Self {
        Self {
            cell_h_pix,
            cell_w_pix,
            w_cells,
            h_cells,
            cell_h_m: 1.0,
            cell_w_m: 1.0,
        }
    }

    /// A standard 8x8 board.
    #[must_use]
    pub fn standard(cell_pix: u32) -> Self {
        Self::new(cell_pix, cell_pix, 8, 8)
    }

    /// Override the physical cell size in metres.
    #[must_use]
    pub fn with_cell_size_m(mut self, cell_h_m: f64, cell_w_m: f64) -> Self {
        self.cell_h_m = cell_h_m;
        self.cell_w_m = cell_w_m;
        self
    }

    /// Board width in cells.
    #[must_use]
    pub fn w_cells(&self) -> i32 {
        self.w_cells
    }

    /// Board height in cells.
    #[must_use]
    pub fn h_cells(&self) -> i32 {
        self.h_cells
    }

    /// Whether a cell lies on the board.
    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        (0..self.h_cells).contains(&cell.row) && (0..self.w_cells).contains(&cell.col)
    }

    /// Top-left corner of a cell in metres, as `(x, y)`.
    #[must_use]
    pub fn cell_to_m(&self, cell: Cell) -> (f64, f64) {
        (
            f64::from(cell.col) * self.cell_w_m,
            f64::from(cell.row) * self.cell_h_m,
        )
    }

    /// The cell containing a point in metres.
    #[must_use]
    pub fn m_to_cell(&self, x_m: f64, y_m: f64) -> Cell {
        Cell::new(
            (y_m / self.cell_h_m).round() as i32,
            (x_m / self.cell_w_m).round() as i32,
        )
    }

    /// A point in metres converted to pixel coordinates.
    #[must_use]
    pub fn m_to_pix(&self, x_m: f64, y_m: f64) -> (i32, i32) {
        (
            (x_m / self.cell_w_m * f64::from(self.cell_w_pix)).round() as i32,
            (y_m / self.cell_h_m * f64::from(self.cell_h_pix)).round() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let board = Board::standard(32);

        assert!(board.contains(Cell::new(0, 0)));
        assert!(board.contains(Cell::new(7, 7)));
        assert!(!board.contains(Cell::new(8, 0)));
        assert!(!board.contains(Cell::new(0, -1)));
    }

    #[test]
    fn test_cell_metre_round_trip() {
        let board = Board::standard(32);

        let cell = Cell::new(3, 5);
        let (x, y) = board.cell_to_m(cell);
        assert_eq!(board.m_to_cell(x, y), cell);
    }

    #[test]
    fn test_m_to_cell_rounds_to_nearest() {
        let board = Board::standard(32);

        // 0.4m into a 1m cell still rounds to the origin cell.
        assert_eq!(board.m_to_cell(0.4, 0.4), Cell::new(0, 0));
        assert_eq!(board.m_to_cell(0.6, 0.6), Cell::new(1, 1));
    }

    #[test]
    fn test_m_to_pix_scales_by_cell_size() {
        let board = Board::standard(32);
        assert_eq!(board.m_to_pix(2.0, 1.0), (64, 32));

        let board = Board::new(32, 32, 8, 8).with_cell_size_m(2.0, 2.0);
        assert_eq!(board.m_to_pix(2.0, 2.0), (32, 32));
    }
}
