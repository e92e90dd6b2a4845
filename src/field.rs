//! Field module - the grid of locked cells
//!
//! Coordinates: `row` grows downward from 0 at the top, `col` grows rightward
//! from 0 at the left. Piece positions use `(x, y)` = `(col, row)` and may lie
//! above the field (`y < 0`) while a piece is entering.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GameError, Result};
use crate::piece::{Color, Piece, Shape};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawCell", into = "RawCell")]
pub enum CellState {
    Empty,
    Filled(Color),
}

impl CellState {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellState::Empty)
    }
}

/// Wire form of a cell: `0` when empty, `[r, g, b]` when filled
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawCell {
    Empty(u8),
    Filled(Color),
}

impl TryFrom<RawCell> for CellState {
    type Error = String;

    fn try_from(raw: RawCell) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawCell::Empty(0) => Ok(CellState::Empty),
            RawCell::Empty(other) => Err(format!("empty cell must be 0, got {other}")),
            RawCell::Filled(color) => Ok(CellState::Filled(color)),
        }
    }
}

impl From<CellState> for RawCell {
    fn from(cell: CellState) -> Self {
        match cell {
            CellState::Empty => RawCell::Empty(0),
            CellState::Filled(color) => RawCell::Filled(color),
        }
    }
}

/// Fixed-size grid of locked cells
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Field {
    rows: usize,
    cols: usize,
    grid: Vec<Vec<CellState>>,
}

impl Field {
    /// Create an empty field. Both dimensions must be positive.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            grid: vec![vec![CellState::Empty; cols]; rows],
        })
    }

    /// Adopt an existing grid of rows. The grid must be a non-empty rectangle.
    pub fn from_grid(grid: Vec<Vec<CellState>>) -> Result<Self> {
        let rows = grid.len();
        let cols = grid.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidDimensions { rows, cols });
        }
        if let Some(bad) = grid.iter().position(|row| row.len() != cols) {
            return Err(GameError::InvalidSnapshot(format!(
                "row {bad} has {} cells, expected {cols}",
                grid[bad].len()
            )));
        }
        Ok(Self { rows, cols, grid })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Rows top to bottom
    pub fn grid(&self) -> &[Vec<CellState>] {
        &self.grid
    }

    pub fn into_grid(self) -> Vec<Vec<CellState>> {
        self.grid
    }

    /// Empty every cell, keeping the dimensions
    pub fn reset(&mut self) {
        for row in &mut self.grid {
            row.fill(CellState::Empty);
        }
    }

    /// Returns None if out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<CellState> {
        self.grid.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Returns false if out of bounds
    pub fn set(&mut self, row: usize, col: usize, cell: CellState) -> bool {
        match self.grid.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Would `shape` anchored at `(x, y)` leave the field or overlap a locked
    /// cell? Cells above the top edge only have to respect the side walls.
    pub fn collides(&self, shape: &Shape, x: i32, y: i32) -> bool {
        shape.cells().any(|(r, c)| {
            // i64: a saved anchor may sit anywhere in the i32 range
            let col = i64::from(x) + c as i64;
            let row = i64::from(y) + r as i64;
            if col < 0 || col >= self.cols as i64 || row >= self.rows as i64 {
                return true;
            }
            row >= 0 && !self.grid[row as usize][col as usize].is_empty()
        })
    }

    pub fn fits(&self, piece: &Piece) -> bool {
        !self.collides(&piece.shape, piece.position.x, piece.position.y)
    }

    /// Write the piece's color into every cell it occupies.
    ///
    /// The caller must have checked [`Field::collides`] first; overlapping an
    /// occupied cell is a bug and panics in debug builds. Cells above the top
    /// edge are dropped.
    pub fn merge(&mut self, piece: &Piece) {
        debug_assert!(
            self.fits(piece),
            "merge at ({}, {}) overlaps the stack or leaves the field",
            piece.position.x,
            piece.position.y
        );
        for block in piece.blocks() {
            if block.y < 0 || block.x < 0 {
                continue;
            }
            self.set(block.y as usize, block.x as usize, CellState::Filled(piece.color));
        }
    }

    /// Remove every full row, shift the remaining rows down keeping their
    /// order, and refill the top with empty rows. Returns the number removed.
    pub fn clear_lines(&mut self) -> u32 {
        let cols = self.cols;
        self.grid.retain(|row| row.iter().any(CellState::is_empty));
        let cleared = self.rows - self.grid.len();
        if cleared > 0 {
            let mut grid = vec![vec![CellState::Empty; cols]; cleared];
            grid.append(&mut self.grid);
            self.grid = grid;
            debug!(cleared, "cleared full rows");
        }
        cleared as u32
    }

    /// Non-mutating form of [`Field::clear_lines`]
    pub fn cleared(&self) -> (Field, u32) {
        let mut next = self.clone();
        let cleared = next.clear_lines();
        (next, cleared)
    }

    /// Check if a specific row is complete (all filled)
    pub fn is_row_complete(&self, row: usize) -> bool {
        self.grid
            .get(row)
            .is_some_and(|r| r.iter().all(|cell| !cell.is_empty()))
    }

    /// Count filled cells in a row
    pub fn filled_count_in_row(&self, row: usize) -> usize {
        self.grid
            .get(row)
            .map_or(0, |r| r.iter().filter(|cell| !cell.is_empty()).count())
    }

    /// Count total filled cells in the field
    pub fn total_filled_cells(&self) -> usize {
        self.grid
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;
    use crate::piece::PURPLE;

    pub fn empty_field() -> Field {
        Field::new(crate::config::DEFAULT_ROWS, crate::config::DEFAULT_COLS)
            .unwrap_or_else(|e| panic!("default field dimensions rejected: {e}"))
    }

    pub fn fill_row(field: &mut Field, row: usize) {
        for col in 0..field.cols() {
            field.set(row, col, CellState::Filled(PURPLE));
        }
    }

    pub fn fill_row_with_gap(field: &mut Field, row: usize, gap_col: usize) {
        for col in 0..field.cols() {
            if col != gap_col {
                field.set(row, col, CellState::Filled(PURPLE));
            }
        }
    }
}
