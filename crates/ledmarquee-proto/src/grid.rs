//! Rectangular grid of pixel intensities.

use crate::errors::{ProtocolError, Result};

/// Rows of a single LED matrix module.
pub const MODULE_HEIGHT: usize = 34;

/// Columns of a single LED matrix module.
pub const MODULE_WIDTH: usize = 9;

/// Fixed-size 2D grid of intensities in `[0, 1]`, stored row-major.
///
/// Row index is the display row, column index the display column. The 1-bit
/// draw path treats any value above zero as lit.
///
/// # Invariants
///
/// - `cells.len() == rows * cols` at all times. Dimensions never change after
///   construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    rows: usize,
    cols: usize,
    cells: Vec<f32>,
}

impl PixelGrid {
    /// All-dark grid of the given size.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols, cells: vec![0.0; rows * cols] }
    }

    /// All-dark grid sized for one module (34x9).
    #[must_use]
    pub fn module() -> Self {
        Self::new(MODULE_HEIGHT, MODULE_WIDTH)
    }

    /// Build a grid from nested rows.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::RaggedGrid` if any row length differs from row 0
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let height = rows.len();
        let mut cells = Vec::with_capacity(height * cols);

        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != cols {
                return Err(ProtocolError::RaggedGrid { row, len: values.len(), expected: cols });
            }
            cells.extend(values);
        }

        Ok(Self { rows: height, cols, cells })
    }

    /// Build a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                cells.push(f(r, c));
            }
        }
        Self { rows, cols, cells }
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at `(row, col)`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.index(row, col).map(|i| self.cells[i])
    }

    /// Value at `(row, col)`, treating cells outside the grid as dark.
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> f32 {
        self.get(row, col).unwrap_or(0.0)
    }

    /// Write `value` at `(row, col)`.
    ///
    /// Returns the previous value, or `None` if the position is outside the
    /// grid (the write is dropped).
    pub fn set(&mut self, row: usize, col: usize, value: f32) -> Option<f32> {
        let i = self.index(row, col)?;
        Some(std::mem::replace(&mut self.cells[i], value))
    }

    /// Reset every cell to `value`.
    pub fn fill(&mut self, value: f32) {
        self.cells.fill(value);
    }

    /// One row as a slice.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        if row < self.rows { Some(&self.cells[row * self.cols..(row + 1) * self.cols]) } else { None }
    }

    /// All cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Check that the grid is exactly `rows` x `cols`.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::GridDimensions` on any mismatch
    pub fn ensure_dimensions(&self, rows: usize, cols: usize) -> Result<()> {
        if self.rows == rows && self.cols == cols {
            Ok(())
        } else {
            Err(ProtocolError::GridDimensions {
                rows,
                cols,
                actual_rows: self.rows,
                actual_cols: self.cols,
            })
        }
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn module_grid_is_dark() {
        let grid = PixelGrid::module();
        assert_eq!((grid.rows(), grid.cols()), (34, 9));
        assert!(grid.cells().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn set_returns_previous_value() {
        let mut grid = PixelGrid::new(2, 3);
        assert_eq!(grid.set(1, 2, 0.5), Some(0.0));
        assert_eq!(grid.set(1, 2, 1.0), Some(0.5));
        assert_eq!(grid.get(1, 2), Some(1.0));
    }

    #[test]
    fn out_of_bounds_is_dropped() {
        let mut grid = PixelGrid::new(2, 3);
        assert_eq!(grid.set(2, 0, 1.0), None);
        assert_eq!(grid.set(0, 3, 1.0), None);
        assert_eq!(grid.get(5, 5), None);
        assert_eq!(grid.value(5, 5), 0.0);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = PixelGrid::from_rows(vec![vec![0.0, 1.0], vec![1.0]]).unwrap_err();
        assert_eq!(err, ProtocolError::RaggedGrid { row: 1, len: 1, expected: 2 });
    }

    #[test]
    fn from_rows_is_row_major() {
        let grid = PixelGrid::from_rows(vec![vec![0.1, 0.2], vec![0.3, 0.4]]).unwrap();
        assert_eq!(grid.cells(), &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(grid.row(1), Some(&[0.3, 0.4][..]));
    }

    #[test]
    fn dimension_check() {
        let grid = PixelGrid::new(9, 34);
        assert!(grid.ensure_dimensions(9, 34).is_ok());
        assert_eq!(
            grid.ensure_dimensions(MODULE_HEIGHT, MODULE_WIDTH),
            Err(ProtocolError::GridDimensions { rows: 34, cols: 9, actual_rows: 9, actual_cols: 34 })
        );
    }
}
