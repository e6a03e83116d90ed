mod builtin;
mod grid;
mod hashing;
mod level;
mod motion;

pub use builtin::builtin_level_definitions;
pub use grid::{CellType, Grid, GridError, GridPos};
pub use level::{Level, LevelDefinition, LevelError, LevelId};
pub use motion::{resolve, Candidate, Direction, Instruction, InvalidDirection};
