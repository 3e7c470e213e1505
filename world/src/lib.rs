#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Immutable maze state consumed by the exploration system.
//!
//! A [`MazeGrid`] is loaded once, either from explicit cell data or from the
//! textual maze format, and never mutated afterwards. Every query is a pure
//! function of the grid and the queried cell, so the grid is shared between
//! worker threads without synchronisation.

use maze_explorer_core::{CellCoord, CellKind};
use thiserror::Error;

/// Reasons a maze description cannot be turned into a [`MazeGrid`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The source contained no header line.
    #[error("maze source is empty")]
    EmptySource,
    /// The header line did not contain exactly two dimensions.
    #[error("could not read the maze dimensions from header '{0}'")]
    InvalidHeader(String),
    /// One of the declared dimensions was zero.
    #[error("maze dimensions {columns}x{rows} describe an empty grid")]
    EmptyMaze {
        /// Declared number of columns.
        columns: u32,
        /// Declared number of rows.
        rows: u32,
    },
    /// The source ended before every declared row was read.
    #[error("could not read row {row} of the maze")]
    MissingRow {
        /// Zero-based index of the first missing row.
        row: u32,
    },
    /// A row held fewer characters than the declared column count.
    #[error("row {row} has {found} cells but the header declares {expected}")]
    ShortRow {
        /// Zero-based index of the short row.
        row: u32,
        /// Declared number of columns.
        expected: u32,
        /// Number of characters present in the row.
        found: usize,
    },
    /// Explicit cell data did not match the declared dimensions.
    #[error("expected {expected} cells but received {found}")]
    CellCountMismatch {
        /// Number of cells implied by the dimensions.
        expected: usize,
        /// Number of cells supplied.
        found: usize,
    },
    /// The declared dimensions describe more cells than can be addressed.
    #[error("maze dimensions {columns}x{rows} are too large")]
    TooLarge {
        /// Declared number of columns.
        columns: u32,
        /// Declared number of rows.
        rows: u32,
    },
}

/// Rectangular maze with a fixed classification for every cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MazeGrid {
    columns: u32,
    rows: u32,
    cells: Vec<CellKind>,
}

impl MazeGrid {
    /// Creates a grid from row-major cell data.
    pub fn new(columns: u32, rows: u32, cells: Vec<CellKind>) -> Result<Self, LoadError> {
        if columns == 0 || rows == 0 {
            return Err(LoadError::EmptyMaze { columns, rows });
        }

        let expected = cell_total(columns, rows)?;
        if cells.len() != expected {
            return Err(LoadError::CellCountMismatch {
                expected,
                found: cells.len(),
            });
        }

        Ok(Self {
            columns,
            rows,
            cells,
        })
    }

    /// Parses the textual maze format.
    ///
    /// The first line holds `columns rows`; each of the following `rows`
    /// lines supplies one character per column. `*` marks a wall, `/` a goal
    /// and any other character open floor. Characters beyond the declared
    /// width are ignored.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let mut lines = source.lines();
        let header = lines.next().ok_or(LoadError::EmptySource)?;
        let (columns, rows) = parse_header(header)?;
        if columns == 0 || rows == 0 {
            return Err(LoadError::EmptyMaze { columns, rows });
        }

        // Header values are untrusted; the source bounds how many cells can follow.
        let total = cell_total(columns, rows)?;
        let width =
            usize::try_from(columns).map_err(|_| LoadError::TooLarge { columns, rows })?;
        let mut cells = Vec::with_capacity(total.min(source.len()));
        for row in 0..rows {
            let line = lines.next().ok_or(LoadError::MissingRow { row })?;
            let before = cells.len();
            cells.extend(line.chars().take(width).map(CellKind::from_glyph));
            let found = cells.len() - before;
            if found < width {
                return Err(LoadError::ShortRow {
                    row,
                    expected: columns,
                    found,
                });
            }
        }

        Self::new(columns, rows, cells)
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Reports whether the cell is a wall. Cells outside the grid are not.
    #[must_use]
    pub fn is_wall(&self, cell: CellCoord) -> bool {
        self.kind(cell) == Some(CellKind::Wall)
    }

    /// Reports whether the cell is a goal. Cells outside the grid are not.
    #[must_use]
    pub fn is_goal(&self, cell: CellCoord) -> bool {
        self.kind(cell) == Some(CellKind::Goal)
    }

    /// Classification of the cell, or `None` outside the grid.
    #[must_use]
    pub fn kind(&self, cell: CellCoord) -> Option<CellKind> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Row-major offset of the cell, or `None` outside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Iterator over every goal cell in row-major order.
    pub fn goals(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.columns;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, kind)| **kind == CellKind::Goal)
            .map(move |(index, _)| {
                let index = index as u64;
                let columns = u64::from(columns);
                CellCoord::new((index % columns) as u32, (index / columns) as u32)
            })
    }

    /// Dense cell classifications stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[CellKind] {
        &self.cells
    }
}

fn cell_total(columns: u32, rows: u32) -> Result<usize, LoadError> {
    usize::try_from(columns)
        .ok()
        .zip(usize::try_from(rows).ok())
        .and_then(|(columns, rows)| columns.checked_mul(rows))
        .ok_or(LoadError::TooLarge { columns, rows })
}

fn parse_header(header: &str) -> Result<(u32, u32), LoadError> {
    let invalid = || LoadError::InvalidHeader(header.trim().to_owned());
    let mut fields = header.split_whitespace();
    let columns = fields
        .next()
        .and_then(|field| field.parse::<u32>().ok())
        .ok_or_else(invalid)?;
    let rows = fields
        .next()
        .and_then(|field| field.parse::<u32>().ok())
        .ok_or_else(invalid)?;
    if fields.next().is_some() {
        return Err(invalid());
    }
    Ok((columns, rows))
}
