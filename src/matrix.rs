use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Configuration
// ============================================================================

pub const FIELD_WIDTH: usize = 10;
pub const FIELD_HEIGHT: usize = 20;

/// Highest cell value; 1..=7 are the piece color ids, 0 is empty.
pub const MAX_CELL: u8 = 7;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

impl Position {
    pub fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum MatrixError {
    #[error("matrix has no rows or no columns")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("cell at row {row}, column {col} holds {value}, above the highest piece id")]
    InvalidCell { row: usize, col: usize, value: u8 },
}

/// Rectangular grid of cell values, stored row-major.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(transparent)]
pub struct Matrix {
    rows: Vec<Vec<u8>>,
}

impl Matrix {
    /// Zero-filled matrix of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            rows: vec![vec![0; width]; height],
        }
    }

    /// The 10x20 playfield.
    pub fn field() -> Self {
        Self::new(FIELD_WIDTH, FIELD_HEIGHT)
    }

    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self, MatrixError> {
        let expected = match rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(MatrixError::Empty),
        };

        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != expected {
                return Err(MatrixError::Ragged {
                    row,
                    expected,
                    found: cells.len(),
                });
            }
            if let Some((col, &value)) = cells.iter().enumerate().find(|(_, v)| **v > MAX_CELL) {
                return Err(MatrixError::InvalidCell { row, col, value });
            }
        }

        Ok(Self { rows })
    }

    /// Builds a matrix from constant data that is known to be well formed.
    pub(crate) fn from_static(rows: &[&[u8]]) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == rows[0].len()));
        Self {
            rows: rows.iter().map(|r| r.to_vec()).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    /// Cell at (x, y), or `None` when the coordinate falls outside the matrix.
    pub fn get(&self, x: i16, y: i16) -> Option<u8> {
        if x < 0 || y < 0 {
            return None;
        }
        self.rows
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
    }

    /// Panics if `value` is not a valid cell (0..=7) or (x, y) is outside.
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        assert!(value <= MAX_CELL, "cell value {} out of range", value);
        self.rows[y][x] = value;
    }

    /// Non-zero cells as (x, y, value).
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, v)| **v != 0)
                .map(move |(x, v)| (x, y, *v))
        })
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied().count()
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows[y].iter().all(|cell| *cell != 0)
    }

    pub fn is_square(&self) -> bool {
        self.rows.iter().all(|row| row.len() == self.rows.len())
    }

    /// Zero every cell, keeping the dimensions.
    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.fill(0);
        }
    }

    /// Removes every full row, inserting an empty row at the top for each one.
    ///
    /// Rows are scanned bottom to top; after a removal the same index is
    /// checked again since the rows above have shifted down into it.
    pub fn sweep_full_rows(&mut self) -> u32 {
        let width = self.width();
        let mut cleared = 0;
        let mut y = self.rows.len();

        while y > 0 {
            if self.is_row_full(y - 1) {
                self.rows.remove(y - 1);
                self.rows.insert(0, vec![0; width]);
                cleared += 1;
            } else {
                y -= 1;
            }
        }

        cleared
    }
}

/// A shape placed at a position on the field.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Piece {
    pub shape: Matrix,
    pub position: Position,
}

impl Piece {
    pub fn new(shape: Matrix, position: Position) -> Self {
        Self { shape, position }
    }

    /// Field coordinates of each occupied cell, with its value.
    pub fn cells(&self) -> impl Iterator<Item = (i16, i16, u8)> + '_ {
        self.shape.occupied().map(move |(x, y, v)| {
            (
                x as i16 + self.position.x,
                y as i16 + self.position.y,
                v,
            )
        })
    }
}

// ============================================================================
// Transforms
// ============================================================================

/// Returns `shape` rotated a quarter turn: clockwise for `direction > 0`,
/// counter-clockwise otherwise.
///
/// Transposes, then reverses each row (clockwise) or the row order
/// (counter-clockwise). Only defined for square shapes.
pub fn rotate(shape: &Matrix, direction: i8) -> Matrix {
    debug_assert!(shape.is_square(), "only square shapes can be rotated");

    let mut rows = shape.rows.clone();
    for y in 0..rows.len() {
        for x in 0..y {
            let tmp = rows[y][x];
            rows[y][x] = rows[x][y];
            rows[x][y] = tmp;
        }
    }

    if direction > 0 {
        for row in &mut rows {
            row.reverse();
        }
    } else {
        rows.reverse();
    }

    Matrix { rows }
}

/// True when any occupied cell of `piece` lands outside `field` or on an
/// occupied field cell.
pub fn collide(field: &Matrix, piece: &Piece) -> bool {
    piece
        .cells()
        .any(|(x, y, _)| field.get(x, y).map_or(true, |cell| cell != 0))
}

/// Writes the piece's occupied cells into the field.
///
/// The caller must have just checked `collide(field, piece)` is false.
pub fn merge(field: &mut Matrix, piece: &Piece) {
    for (x, y, value) in piece.cells() {
        debug_assert_eq!(field.get(x, y), Some(0), "merge onto occupied or missing cell");
        if field.get(x, y).is_some() {
            field.set(x as usize, y as usize, value);
        }
    }
}
