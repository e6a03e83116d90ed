use super::level::{LevelDefinition, LevelId};
use super::motion::Direction;

struct BuiltinLevel {
    id: u64,
    name: &'static str,
    description: &'static str,
    start_dir: Direction,
    par: u32,
    grid: &'static [&'static [u8]],
}

const BUILTIN_LEVELS: &[BuiltinLevel] = &[
    BuiltinLevel {
        id: 1,
        name: "Module 1: Forward Motion",
        description: "Program the bot to move forward to the goal.",
        start_dir: Direction::East,
        par: 3,
        grid: &[&[0, 0, 0, 0, 0], &[0, 2, 1, 1, 3], &[0, 0, 0, 0, 0]],
    },
    BuiltinLevel {
        id: 2,
        name: "Module 2: Turning",
        description: "The bot needs to turn to reach the destination.",
        start_dir: Direction::East,
        par: 4,
        grid: &[
            &[0, 0, 0, 0, 0, 0],
            &[0, 2, 1, 1, 0, 0],
            &[0, 0, 0, 1, 0, 0],
            &[0, 0, 0, 3, 0, 0],
            &[0, 0, 0, 0, 0, 0],
        ],
    },
    BuiltinLevel {
        id: 3,
        name: "Module 3: Obstacles",
        description: "Avoid the walls! Navigate around the obstacles.",
        start_dir: Direction::East,
        par: 6,
        grid: &[
            &[0, 0, 0, 0, 0, 0],
            &[0, 2, 1, 4, 1, 3],
            &[0, 0, 1, 4, 1, 0],
            &[0, 0, 1, 1, 1, 0],
            &[0, 0, 0, 0, 0, 0],
        ],
    },
    BuiltinLevel {
        id: 4,
        name: "Module 4: Jumping",
        description: "Use the Jump block to cross the gaps.",
        start_dir: Direction::East,
        par: 5,
        grid: &[&[0, 0, 0, 0, 0, 0], &[0, 2, 1, 0, 1, 3], &[0, 0, 0, 0, 0, 0]],
    },
    BuiltinLevel {
        id: 5,
        name: "Module 5: Advanced Maneuvers",
        description: "Combine turning and jumping to solve this pattern.",
        start_dir: Direction::South,
        par: 9,
        grid: &[
            &[0, 2, 0, 0, 0, 0],
            &[0, 1, 0, 1, 1, 3],
            &[0, 1, 0, 1, 0, 0],
            &[0, 1, 1, 1, 0, 0],
            &[0, 0, 0, 0, 0, 0],
        ],
    },
    BuiltinLevel {
        id: 6,
        name: "Module 6: Final Exam",
        description: "Navigate walls and voids to earn your badge.",
        start_dir: Direction::East,
        par: 12,
        grid: &[
            &[0, 0, 0, 0, 0, 0, 0],
            &[0, 2, 1, 1, 4, 3, 0],
            &[0, 0, 0, 1, 4, 1, 0],
            &[0, 0, 0, 1, 0, 1, 0],
            &[0, 0, 0, 1, 1, 1, 0],
            &[0, 0, 0, 0, 0, 0, 0],
        ],
    },
];

/// The six training modules shipped with the game, in unlock order.
pub fn builtin_level_definitions() -> Vec<LevelDefinition> {
    BUILTIN_LEVELS
        .iter()
        .map(|level| LevelDefinition {
            id: LevelId::Number(level.id),
            name: level.name.to_string(),
            description: level.description.to_string(),
            grid: level.grid.iter().map(|row| row.to_vec()).collect(),
            start_dir: level.start_dir,
            par: level.par,
        })
        .collect()
}
