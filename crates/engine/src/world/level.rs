use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::grid::{Grid, GridError, GridPos};
use super::hashing::hash_level_layout;
use super::motion::Direction;

/// Level identifier. Built-in levels use numbers, generated ones strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelId {
    Number(u64),
    Name(String),
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Name(value) => f.write_str(value),
        }
    }
}

impl From<u64> for LevelId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for LevelId {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

/// Level as stored on disk or produced by a generator. Not yet validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDefinition {
    pub id: LevelId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub grid: Vec<Vec<u8>>,
    pub start_dir: Direction,
    #[serde(default)]
    pub par: u32,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level {id} has an invalid grid: {source}")]
    InvalidGrid {
        id: LevelId,
        #[source]
        source: GridError,
    },
}

/// A level whose grid passed every structural check. Only these can be run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    id: LevelId,
    name: String,
    description: String,
    grid: Grid,
    start: GridPos,
    start_direction: Direction,
    goal_count: usize,
    par: u32,
}

impl Level {
    pub fn from_definition(definition: LevelDefinition) -> Result<Self, LevelError> {
        let LevelDefinition {
            id,
            name,
            description,
            grid,
            start_dir,
            par,
        } = definition;

        let grid = match Grid::from_rows(&grid) {
            Ok(grid) => grid,
            Err(source) => return Err(LevelError::InvalidGrid { id, source }),
        };
        let start = match grid.find_start() {
            Ok(start) => start,
            Err(source) => return Err(LevelError::InvalidGrid { id, source }),
        };
        let goal_count = grid.count_goals();

        Ok(Self {
            id,
            name,
            description,
            grid,
            start,
            start_direction: start_dir,
            goal_count,
            par,
        })
    }

    pub fn to_definition(&self) -> LevelDefinition {
        LevelDefinition {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            grid: self
                .grid
                .rows()
                .map(|row| row.iter().map(|cell| cell.code()).collect())
                .collect(),
            start_dir: self.start_direction,
            par: self.par,
        }
    }

    pub fn id(&self) -> &LevelId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn start(&self) -> GridPos {
        self.start
    }

    pub fn start_direction(&self) -> Direction {
        self.start_direction
    }

    pub fn goal_count(&self) -> usize {
        self.goal_count
    }

    pub fn par(&self) -> u32 {
        self.par
    }

    /// Stable content hash of the playable layout; name and text are excluded.
    pub fn fingerprint(&self) -> String {
        hash_level_layout(&self.grid, self.start_direction)
    }
}
