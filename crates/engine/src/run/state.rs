use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::world::{resolve, Candidate, CellType, Direction, Grid, GridPos, Instruction, Level};

pub const FALLBACK_LOSS_MESSAGE: &str = "Try again.";
pub const WIN_MESSAGE: &str = "Module complete!";

/// Identifies one run (or one reset epoch) of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RunId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Won,
    Lost,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LossReason {
    FellOffWorld,
    FellIntoVoid,
    HitWall,
    GoalNotReached,
}

impl LossReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::FellOffWorld => "The bot fell off the world!",
            Self::FellIntoVoid => "The bot fell into the void!",
            Self::HitWall => "The bot crashed into a wall!",
            Self::GoalNotReached => "Goal not reached.",
        }
    }
}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub reason: Option<LossReason>,
}

impl RunOutcome {
    pub fn won() -> Self {
        Self {
            status: RunStatus::Won,
            reason: None,
        }
    }

    pub fn lost(reason: LossReason) -> Self {
        Self {
            status: RunStatus::Lost,
            reason: Some(reason),
        }
    }

    pub fn is_won(&self) -> bool {
        self.status == RunStatus::Won
    }

    pub fn message(&self) -> &'static str {
        match (self.status, self.reason) {
            (_, Some(reason)) => reason.message(),
            (RunStatus::Won, None) => WIN_MESSAGE,
            _ => FALLBACK_LOSS_MESSAGE,
        }
    }
}

/// Everything a renderer or UI may observe about the bot at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub run_id: RunId,
    pub position: GridPos,
    pub direction: Direction,
    pub is_jumping: bool,
    pub collected: BTreeSet<GridPos>,
    pub active_index: Option<usize>,
    pub status: RunStatus,
}

impl Snapshot {
    pub fn collected_keys(&self) -> Vec<String> {
        self.collected.iter().map(|pos| pos.key()).collect()
    }
}

/// Why a translating instruction may not land on `target`, if it may not.
pub fn check_landing(grid: &Grid, target: GridPos) -> Result<(), LossReason> {
    match grid.get(target) {
        None => Err(LossReason::FellOffWorld),
        Some(CellType::Void) => Err(LossReason::FellIntoVoid),
        Some(CellType::Wall) => Err(LossReason::HitWall),
        Some(_) => Ok(()),
    }
}

/// Mutable state of one run. Performs no waiting; see `RunSession` for timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    run_id: RunId,
    position: GridPos,
    direction: Direction,
    is_jumping: bool,
    collected: BTreeSet<GridPos>,
    active_index: Option<usize>,
    status: RunStatus,
    reason: Option<LossReason>,
}

impl RunState {
    pub fn new(level: &Level) -> Self {
        let mut state = Self {
            run_id: RunId::default(),
            position: level.start(),
            direction: level.start_direction(),
            is_jumping: false,
            collected: BTreeSet::new(),
            active_index: None,
            status: RunStatus::Idle,
            reason: None,
        };
        state.reset(level, RunId::default());
        state
    }

    pub fn reset(&mut self, level: &Level, run_id: RunId) -> Snapshot {
        let start = level.start();
        self.run_id = run_id;
        self.position = start;
        self.direction = level.start_direction();
        self.is_jumping = false;
        self.collected.clear();
        if level.grid().get(start) == Some(CellType::Goal) {
            self.collected.insert(start);
        }
        self.active_index = None;
        self.status = RunStatus::Idle;
        self.reason = None;
        self.snapshot()
    }

    pub fn begin(&mut self) {
        self.status = RunStatus::Running;
    }

    /// Executes `instruction` as block `index`: resolve, check, commit.
    ///
    /// On a fatal landing the state turns `Lost` and nothing is committed.
    pub fn apply(
        &mut self,
        grid: &Grid,
        index: usize,
        instruction: Instruction,
    ) -> Result<Candidate, LossReason> {
        self.active_index = Some(index);
        self.is_jumping = false;

        let candidate = resolve(self.position, self.direction, instruction);
        if instruction.is_translation() {
            if let Err(reason) = check_landing(grid, candidate.position) {
                self.status = RunStatus::Lost;
                self.reason = Some(reason);
                return Err(reason);
            }
        }

        self.position = candidate.position;
        self.direction = candidate.direction;
        self.is_jumping = instruction == Instruction::Jump;
        Ok(candidate)
    }

    /// Collects the goal under the bot, returning it if it was new.
    pub fn collect_current(&mut self, grid: &Grid) -> Option<GridPos> {
        if grid.get(self.position) != Some(CellType::Goal) {
            return None;
        }
        if self.collected.insert(self.position) {
            Some(self.position)
        } else {
            None
        }
    }

    /// Ends the instruction stream and decides the outcome.
    pub fn conclude(&mut self, goal_count: usize) -> RunOutcome {
        self.active_index = None;
        self.is_jumping = false;
        let outcome = if self.collected.len() == goal_count {
            RunOutcome::won()
        } else {
            RunOutcome::lost(LossReason::GoalNotReached)
        };
        self.status = outcome.status;
        self.reason = outcome.reason;
        outcome
    }

    pub fn clear_jump(&mut self) {
        self.is_jumping = false;
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        if !self.status.is_terminal() {
            return None;
        }
        Some(RunOutcome {
            status: self.status,
            reason: self.reason,
        })
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn position(&self) -> GridPos {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn collected(&self) -> &BTreeSet<GridPos> {
        &self.collected
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            run_id: self.run_id,
            position: self.position,
            direction: self.direction,
            is_jumping: self.is_jumping,
            collected: self.collected.clone(),
            active_index: self.active_index,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{LevelDefinition, LevelId};

    fn level(grid: Vec<Vec<u8>>, start_dir: Direction) -> Level {
        Level::from_definition(LevelDefinition {
            id: LevelId::Number(1),
            name: "state".to_string(),
            description: String::new(),
            grid,
            start_dir,
            par: 0,
        })
        .expect("level")
    }

    #[test]
    fn landing_checks_bounds_then_cell_type() {
        let grid = Grid::from_rows(&[[0u8, 2, 4, 3]]).expect("grid");
        assert_eq!(
            check_landing(&grid, GridPos::new(4, 0)),
            Err(LossReason::FellOffWorld)
        );
        assert_eq!(
            check_landing(&grid, GridPos::new(0, -1)),
            Err(LossReason::FellOffWorld)
        );
        assert_eq!(
            check_landing(&grid, GridPos::new(0, 0)),
            Err(LossReason::FellIntoVoid)
        );
        assert_eq!(
            check_landing(&grid, GridPos::new(2, 0)),
            Err(LossReason::HitWall)
        );
        assert_eq!(check_landing(&grid, GridPos::new(3, 0)), Ok(()));
        assert_eq!(check_landing(&grid, GridPos::new(1, 0)), Ok(()));
    }

    #[test]
    fn turning_is_legal_even_when_surrounded_by_void() {
        let level = level(vec![vec![0, 0, 0], vec![0, 2, 0], vec![0, 0, 0]], Direction::North);
        let mut state = RunState::new(&level);
        state.begin();
        let candidate = state
            .apply(level.grid(), 0, Instruction::TurnLeft)
            .expect("turn is legal");
        assert_eq!(candidate.position, GridPos::new(1, 1));
        assert_eq!(state.direction(), Direction::West);
        assert_eq!(state.status(), RunStatus::Running);
    }

    #[test]
    fn fatal_landing_does_not_commit() {
        let level = level(vec![vec![2, 4, 3]], Direction::East);
        let mut state = RunState::new(&level);
        state.begin();
        let err = state
            .apply(level.grid(), 0, Instruction::Move)
            .expect_err("wall");
        assert_eq!(err, LossReason::HitWall);
        assert_eq!(state.position(), GridPos::new(0, 0));
        assert_eq!(state.outcome(), Some(RunOutcome::lost(LossReason::HitWall)));
        assert_eq!(state.snapshot().active_index, Some(0));
    }

    #[test]
    fn jump_flag_tracks_the_latest_instruction() {
        let level = level(vec![vec![2, 0, 1, 1]], Direction::East);
        let mut state = RunState::new(&level);
        state.begin();
        state
            .apply(level.grid(), 0, Instruction::Jump)
            .expect("jump over void");
        assert!(state.snapshot().is_jumping);
        state
            .apply(level.grid(), 1, Instruction::Move)
            .expect("move");
        assert!(!state.snapshot().is_jumping);
    }

    #[test]
    fn goal_is_collected_once() {
        let level = level(vec![vec![2, 3, 1]], Direction::East);
        let mut state = RunState::new(&level);
        state.begin();
        state.apply(level.grid(), 0, Instruction::Move).expect("move");
        assert_eq!(
            state.collect_current(level.grid()),
            Some(GridPos::new(1, 0))
        );
        state
            .apply(level.grid(), 1, Instruction::TurnRight)
            .expect("turn");
        assert_eq!(state.collect_current(level.grid()), None);
        assert_eq!(state.collected().len(), 1);
    }

    #[test]
    fn zero_goal_level_is_won_on_conclusion() {
        let level = level(vec![vec![2, 1]], Direction::East);
        let mut state = RunState::new(&level);
        assert!(state.collected().is_empty());
        state.begin();
        assert_eq!(state.conclude(level.goal_count()), RunOutcome::won());
        assert_eq!(state.snapshot().active_index, None);
    }

    #[test]
    fn reset_clears_a_finished_run() {
        let level = level(vec![vec![2, 3, 0]], Direction::East);
        let mut state = RunState::new(&level);
        let initial = state.snapshot();
        state.begin();
        state.apply(level.grid(), 0, Instruction::Move).expect("move");
        state.collect_current(level.grid());
        let _ = state.apply(level.grid(), 1, Instruction::Move);
        assert_eq!(state.status(), RunStatus::Lost);

        let snapshot = state.reset(&level, RunId::default());
        assert_eq!(snapshot, initial);
        assert_eq!(state.outcome(), None);
    }

    #[test]
    fn outcome_messages_fall_back_without_reason() {
        assert_eq!(
            RunOutcome::lost(LossReason::FellIntoVoid).message(),
            "The bot fell into the void!"
        );
        let bare = RunOutcome {
            status: RunStatus::Lost,
            reason: None,
        };
        assert_eq!(bare.message(), FALLBACK_LOSS_MESSAGE);
        assert_eq!(RunOutcome::won().message(), WIN_MESSAGE);
    }
}
