use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::grid::GridPos;

/// Compass orientation. Codes follow level files: 0 north, 1 east, 2 south, 3 west.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Direction {
    North,
    #[default]
    East,
    South,
    West,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("direction code must be 0..=3, got {0}")]
pub struct InvalidDirection(pub u8);

impl Direction {
    const CLOCKWISE: [Direction; 4] = [Self::North, Self::East, Self::South, Self::West];

    pub fn code(self) -> u8 {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    pub fn turned_left(self) -> Self {
        Self::CLOCKWISE[(self.code() as usize + 3) % 4]
    }

    pub fn turned_right(self) -> Self {
        Self::CLOCKWISE[(self.code() as usize + 1) % 4]
    }

    /// Unit step as `(dx, dz)`. North is toward smaller z.
    pub fn unit(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    pub fn arrow(self) -> char {
        match self {
            Self::North => '^',
            Self::East => '>',
            Self::South => 'v',
            Self::West => '<',
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = InvalidDirection;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::CLOCKWISE
            .get(code as usize)
            .copied()
            .ok_or(InvalidDirection(code))
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> Self {
        direction.code()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Instruction {
    Move,
    Jump,
    TurnLeft,
    TurnRight,
}

impl Instruction {
    /// Cells travelled along the facing direction.
    pub fn distance(self) -> i32 {
        match self {
            Self::Move => 1,
            Self::Jump => 2,
            Self::TurnLeft | Self::TurnRight => 0,
        }
    }

    pub fn is_translation(self) -> bool {
        self.distance() > 0
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Move => "MOVE",
            Self::Jump => "JUMP",
            Self::TurnLeft => "TURN_LEFT",
            Self::TurnRight => "TURN_RIGHT",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub position: GridPos,
    pub direction: Direction,
}

/// Where `instruction` would put the bot, ignoring the grid entirely.
///
/// A jump lands two cells ahead; the cell it passes over is never looked at.
pub fn resolve(position: GridPos, direction: Direction, instruction: Instruction) -> Candidate {
    match instruction {
        Instruction::Move | Instruction::Jump => {
            let (dx, dz) = direction.unit();
            let distance = instruction.distance();
            Candidate {
                position: position.offset(dx * distance, dz * distance),
                direction,
            }
        }
        Instruction::TurnLeft => Candidate {
            position,
            direction: direction.turned_left(),
        },
        Instruction::TurnRight => Candidate {
            position,
            direction: direction.turned_right(),
        },
    }
}
