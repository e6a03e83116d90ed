use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cell classification codes as they appear in level files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellType {
    Void = 0,
    Path = 1,
    Start = 2,
    Goal = 3,
    Wall = 4,
}

impl CellType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Void),
            1 => Some(Self::Path),
            2 => Some(Self::Start),
            3 => Some(Self::Goal),
            4 => Some(Self::Wall),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Integer cell coordinate. `x` is the column, `z` the row.
///
/// Coordinates are signed so that motion candidates outside the grid are
/// representable; the grid decides whether they exist.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridPos {
    pub x: i32,
    pub z: i32,
}

impl GridPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            z: self.z.saturating_add(dz),
        }
    }

    /// `"x,z"` form used for collected-set keys.
    pub fn key(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid has no cells")]
    Empty,
    #[error("grid row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown cell code {code} at {x},{z}")]
    UnknownCellCode { x: usize, z: usize, code: u8 },
    #[error("position {0} is outside the grid")]
    OutOfBounds(GridPos),
    #[error("grid has no start cell")]
    MissingStart,
    #[error("grid has {count} start cells, expected exactly one")]
    MultipleStarts { count: usize },
}

/// Row-major cell matrix, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    depth: usize,
    cells: Vec<CellType>,
}

impl Grid {
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, GridError> {
        let depth = rows.len();
        let width = rows.first().map(|row| row.as_ref().len()).unwrap_or(0);
        if depth == 0 || width == 0 {
            return Err(GridError::Empty);
        }

        let mut cells = Vec::with_capacity(width * depth);
        for (z, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(GridError::RaggedRow {
                    row: z,
                    expected: width,
                    actual: row.len(),
                });
            }
            for (x, code) in row.iter().copied().enumerate() {
                let cell =
                    CellType::from_code(code).ok_or(GridError::UnknownCellCode { x, z, code })?;
                cells.push(cell);
            }
        }

        Ok(Self {
            width,
            depth,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn index_of(&self, pos: GridPos) -> Option<usize> {
        if pos.x < 0 || pos.z < 0 {
            return None;
        }
        let (x, z) = (pos.x as usize, pos.z as usize);
        if x >= self.width || z >= self.depth {
            return None;
        }
        Some(z * self.width + x)
    }

    pub fn get(&self, pos: GridPos) -> Option<CellType> {
        self.index_of(pos)
            .and_then(|index| self.cells.get(index).copied())
    }

    pub fn cell_at(&self, pos: GridPos) -> Result<CellType, GridError> {
        self.get(pos).ok_or(GridError::OutOfBounds(pos))
    }

    pub fn find_start(&self) -> Result<GridPos, GridError> {
        let mut starts = self.positions_of(CellType::Start);
        match (starts.next(), starts.count()) {
            (None, _) => Err(GridError::MissingStart),
            (Some(start), 0) => Ok(start),
            (Some(_), extra) => Err(GridError::MultipleStarts { count: extra + 1 }),
        }
    }

    pub fn count_goals(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell == CellType::Goal)
            .count()
    }

    pub fn goal_positions(&self) -> Vec<GridPos> {
        self.positions_of(CellType::Goal).collect()
    }

    /// Cells in row-major order, row index first.
    pub fn rows(&self) -> impl Iterator<Item = &[CellType]> + '_ {
        self.cells.chunks(self.width)
    }

    fn positions_of(&self, wanted: CellType) -> impl Iterator<Item = GridPos> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, cell)| **cell == wanted)
            .map(move |(index, _)| GridPos::new((index % width) as i32, (index / width) as i32))
    }
}
