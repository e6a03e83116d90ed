use std::time::Duration;

use tracing::{debug, info};

use super::state::{LossReason, RunId, RunOutcome, RunState, RunStatus, Snapshot};
use super::timing::RunTiming;
use crate::world::{GridPos, Instruction, Level};

/// Observable effect of one step of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// Pre-run reset snapshot.
    Started(Snapshot),
    /// Block `index` moved or turned the bot.
    Committed {
        index: usize,
        instruction: Instruction,
        snapshot: Snapshot,
    },
    /// Collection check for block `index` ran; `collected` is the newly taken goal.
    Settled {
        index: usize,
        collected: Option<GridPos>,
        snapshot: Snapshot,
    },
    /// Every block executed without dying; the outcome follows after a settle.
    Completed(Snapshot),
    Finished {
        outcome: RunOutcome,
        snapshot: Snapshot,
    },
}

impl RunEvent {
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            Self::Started(snapshot) | Self::Completed(snapshot) => snapshot,
            Self::Committed { snapshot, .. }
            | Self::Settled { snapshot, .. }
            | Self::Finished { snapshot, .. } => snapshot,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Started(_) => "started",
            Self::Committed { .. } => "committed",
            Self::Settled { .. } => "settled",
            Self::Completed(_) => "completed",
            Self::Finished { .. } => "finished",
        }
    }
}

/// An event plus how long the run sleeps before it may resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suspension {
    pub event: RunEvent,
    pub resume_after: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Execute(usize),
    Arrived(usize),
    Concluding,
}

#[derive(Debug, Clone)]
struct RunCursor {
    instructions: Vec<Instruction>,
    phase: Phase,
}

/// Result of driving a run to completion without waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub initial: Snapshot,
    pub commits: Vec<Snapshot>,
    pub events: Vec<RunEvent>,
    pub outcome: RunOutcome,
    pub final_snapshot: Snapshot,
    /// Sum of every suspension the run asked for.
    pub scheduled_duration: Duration,
}

/// Caller-owned run session for one level.
///
/// The run is a generator: `start` performs the reset handshake, then each
/// `resume` advances to the next suspension point and reports what became
/// observable. Starting again or resetting drops the in-flight cursor, so an
/// abandoned run can never emit another event.
#[derive(Debug, Clone)]
pub struct RunSession {
    level: Level,
    timing: RunTiming,
    state: RunState,
    last_run_id: RunId,
    cursor: Option<RunCursor>,
}

impl RunSession {
    pub fn new(level: Level, timing: RunTiming) -> Self {
        let state = RunState::new(&level);
        Self {
            level,
            timing,
            state,
            last_run_id: RunId::default(),
            cursor: None,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn is_running(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn status(&self) -> RunStatus {
        self.state.status()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        self.state.outcome()
    }

    /// Swaps in another level and resets onto it.
    pub fn load_level(&mut self, level: Level) -> Snapshot {
        self.level = level;
        self.cursor = None;
        let run_id = self.next_run_id();
        self.state.reset(&self.level, run_id)
    }

    /// Returns the bot to the start. Aborts any run in flight.
    ///
    /// Resetting an already idle session changes nothing, so repeated resets
    /// produce identical snapshots.
    pub fn reset(&mut self) -> Snapshot {
        let aborted = self.cursor.take().is_some();
        if !aborted && self.state.status() == RunStatus::Idle {
            return self.state.reset(&self.level, self.state.run_id());
        }
        if aborted {
            info!(run_id = self.state.run_id().0, "run_aborted");
        }
        let run_id = self.next_run_id();
        self.state.reset(&self.level, run_id)
    }

    /// Begins a fresh run of `instructions`, superseding any run in flight.
    pub fn start(&mut self, instructions: &[Instruction]) -> Suspension {
        if self.cursor.is_some() {
            info!(run_id = self.state.run_id().0, "run_superseded");
        }
        let run_id = self.next_run_id();
        self.state.reset(&self.level, run_id);
        self.state.begin();
        self.cursor = Some(RunCursor {
            instructions: instructions.to_vec(),
            phase: Phase::Execute(0),
        });
        info!(
            run_id = run_id.0,
            level = %self.level.id(),
            instruction_count = instructions.len(),
            "run_started"
        );
        Suspension {
            event: RunEvent::Started(self.state.snapshot()),
            resume_after: self.timing.reset_delay,
        }
    }

    /// Advances to the next suspension point. `None` once the run is over.
    pub fn resume(&mut self) -> Option<Suspension> {
        let cursor = self.cursor.as_mut()?;
        let grid = self.level.grid();

        match cursor.phase {
            Phase::Execute(index) => {
                let Some(instruction) = cursor.instructions.get(index).copied() else {
                    cursor.phase = Phase::Concluding;
                    self.state.clear_jump();
                    return Some(Suspension {
                        event: RunEvent::Completed(self.state.snapshot()),
                        resume_after: self.timing.post_run_settle,
                    });
                };

                match self.state.apply(grid, index, instruction) {
                    Ok(candidate) => {
                        debug!(
                            run_id = self.state.run_id().0,
                            index,
                            instruction = %instruction,
                            position = %candidate.position,
                            direction = %candidate.direction,
                            "instruction_committed"
                        );
                        cursor.phase = Phase::Arrived(index);
                        Some(Suspension {
                            event: RunEvent::Committed {
                                index,
                                instruction,
                                snapshot: self.state.snapshot(),
                            },
                            resume_after: self.timing.arrival_delay(),
                        })
                    }
                    Err(reason) => {
                        self.cursor = None;
                        let outcome = RunOutcome::lost(reason);
                        info!(
                            run_id = self.state.run_id().0,
                            index,
                            instruction = %instruction,
                            reason = ?reason,
                            "run_finished"
                        );
                        Some(Suspension {
                            event: RunEvent::Finished {
                                outcome,
                                snapshot: self.state.snapshot(),
                            },
                            resume_after: Duration::ZERO,
                        })
                    }
                }
            }
            Phase::Arrived(index) => {
                let collected = self.state.collect_current(grid);
                if let Some(position) = collected {
                    debug!(
                        run_id = self.state.run_id().0,
                        index,
                        position = %position,
                        "goal_collected"
                    );
                }
                cursor.phase = Phase::Execute(index + 1);
                Some(Suspension {
                    event: RunEvent::Settled {
                        index,
                        collected,
                        snapshot: self.state.snapshot(),
                    },
                    resume_after: self.timing.settle_delay(),
                })
            }
            Phase::Concluding => {
                self.cursor = None;
                let outcome = self.state.conclude(self.level.goal_count());
                info!(
                    run_id = self.state.run_id().0,
                    status = ?outcome.status,
                    reason = ?outcome.reason,
                    collected = self.state.collected().len(),
                    goals = self.level.goal_count(),
                    "run_finished"
                );
                Some(Suspension {
                    event: RunEvent::Finished {
                        outcome,
                        snapshot: self.state.snapshot(),
                    },
                    resume_after: Duration::ZERO,
                })
            }
        }
    }

    /// Runs `instructions` start to finish, collecting every event without sleeping.
    pub fn run_to_completion(&mut self, instructions: &[Instruction]) -> RunReport {
        let started = self.start(instructions);
        let initial = started.event.snapshot().clone();
        let mut scheduled_duration = started.resume_after;
        let mut events = vec![started.event];
        let mut commits = Vec::new();

        while let Some(suspension) = self.resume() {
            scheduled_duration = scheduled_duration.saturating_add(suspension.resume_after);
            if let RunEvent::Committed { snapshot, .. } = &suspension.event {
                commits.push(snapshot.clone());
            }
            events.push(suspension.event);
        }

        let final_snapshot = self.state.snapshot();
        let outcome = self
            .state
            .outcome()
            .unwrap_or_else(|| RunOutcome::lost(LossReason::GoalNotReached));
        RunReport {
            initial,
            commits,
            events,
            outcome,
            final_snapshot,
            scheduled_duration,
        }
    }

    fn next_run_id(&mut self) -> RunId {
        self.last_run_id = RunId(self.last_run_id.0.saturating_add(1));
        self.last_run_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::state::LossReason;
    use crate::world::{Direction, LevelDefinition, LevelId};

    use Instruction::{Jump, Move, TurnLeft, TurnRight};

    fn level_from(grid: Vec<Vec<u8>>, start_dir: Direction) -> Level {
        Level::from_definition(LevelDefinition {
            id: LevelId::Number(1),
            name: "session".to_string(),
            description: String::new(),
            grid,
            start_dir,
            par: 0,
        })
        .expect("level")
    }

    fn corridor() -> Level {
        level_from(
            vec![vec![0, 0, 0, 0], vec![0, 2, 1, 3], vec![0, 0, 0, 0]],
            Direction::East,
        )
    }

    fn instant(level: Level) -> RunSession {
        RunSession::new(level, RunTiming::instant())
    }

    #[test]
    fn two_moves_reach_the_goal() {
        let mut session = instant(corridor());
        let report = session.run_to_completion(&[Move, Move]);
        assert_eq!(report.outcome, RunOutcome::won());
        assert_eq!(report.final_snapshot.position, GridPos::new(3, 1));
        assert_eq!(report.final_snapshot.collected_keys(), vec!["3,1".to_string()]);
        assert_eq!(report.commits.len(), 2);
        assert_eq!(session.status(), RunStatus::Won);
        assert!(!session.is_running());
    }

    #[test]
    fn third_move_falls_off_the_world() {
        let mut session = instant(corridor());
        let report = session.run_to_completion(&[Move, Move, Move]);
        assert_eq!(report.outcome, RunOutcome::lost(LossReason::FellOffWorld));
        assert_eq!(report.commits.len(), 2);
        assert_eq!(report.final_snapshot.position, GridPos::new(3, 1));
        assert_eq!(report.final_snapshot.active_index, Some(2));
        assert_eq!(report.outcome.message(), "The bot fell off the world!");
    }

    #[test]
    fn jump_clears_a_void_gap() {
        let mut session = instant(level_from(vec![vec![2, 0, 3]], Direction::East));
        let report = session.run_to_completion(&[Jump]);
        assert_eq!(report.outcome, RunOutcome::won());
        assert_eq!(report.final_snapshot.position, GridPos::new(2, 0));
    }

    #[test]
    fn jump_clears_a_wall_and_lands_on_path() {
        let mut session = instant(level_from(vec![vec![2, 4, 1, 3]], Direction::East));
        let report = session.run_to_completion(&[Jump, Move]);
        assert_eq!(report.outcome, RunOutcome::won());
    }

    #[test]
    fn moving_into_void_or_wall_loses_immediately() {
        let mut session = instant(level_from(vec![vec![2, 0, 3]], Direction::East));
        let report = session.run_to_completion(&[Move, Jump]);
        assert_eq!(report.outcome, RunOutcome::lost(LossReason::FellIntoVoid));
        assert!(report.commits.is_empty());

        let mut session = instant(level_from(vec![vec![2, 4, 3]], Direction::East));
        let report = session.run_to_completion(&[Move]);
        assert_eq!(report.outcome, RunOutcome::lost(LossReason::HitWall));
    }

    #[test]
    fn visiting_every_goal_after_dying_is_still_a_loss() {
        let mut session = instant(level_from(vec![vec![3, 2, 0]], Direction::East));
        let report = session.run_to_completion(&[Move, TurnLeft, TurnLeft, Move]);
        assert_eq!(report.outcome, RunOutcome::lost(LossReason::FellIntoVoid));
        assert!(report.final_snapshot.collected.is_empty());
    }

    #[test]
    fn all_goals_are_required() {
        let level = level_from(vec![vec![3, 2, 1, 3]], Direction::East);
        let mut session = instant(level);
        let partial = session.run_to_completion(&[Move, Move]);
        assert_eq!(partial.outcome, RunOutcome::lost(LossReason::GoalNotReached));
        assert_eq!(partial.outcome.message(), "Goal not reached.");

        let full = session.run_to_completion(&[Move, Move, TurnLeft, TurnLeft, Jump, Move]);
        assert_eq!(full.outcome, RunOutcome::won());
        assert_eq!(full.final_snapshot.collected.len(), 2);
    }

    #[test]
    fn revisiting_a_goal_does_not_double_count() {
        let level = level_from(vec![vec![2, 3, 1, 3]], Direction::East);
        let mut session = instant(level);
        let report = session.run_to_completion(&[Move, TurnRight, TurnRight, Move, TurnLeft, TurnLeft, Move]);
        assert_eq!(report.outcome, RunOutcome::lost(LossReason::GoalNotReached));
        assert_eq!(report.final_snapshot.collected.len(), 1);
    }

    #[test]
    fn empty_program_depends_on_goal_count() {
        let mut with_goal = instant(corridor());
        let report = with_goal.run_to_completion(&[]);
        assert_eq!(report.outcome, RunOutcome::lost(LossReason::GoalNotReached));
        assert!(report.commits.is_empty());

        let mut without_goal = instant(level_from(vec![vec![2, 1]], Direction::East));
        assert_eq!(without_goal.run_to_completion(&[]).outcome, RunOutcome::won());
    }

    #[test]
    fn turns_never_move_and_moves_never_turn() {
        let level = level_from(
            vec![vec![1, 1, 1], vec![1, 2, 1], vec![1, 1, 1]],
            Direction::North,
        );
        let mut session = instant(level);
        let program = [TurnLeft, Move, TurnRight, TurnRight, Jump, TurnRight, Move];
        let report = session.run_to_completion(&program);

        let mut previous = report.initial.clone();
        let committed = report.events.iter().filter_map(|event| match event {
            RunEvent::Committed {
                instruction,
                snapshot,
                ..
            } => Some((*instruction, snapshot)),
            _ => None,
        });
        for (instruction, snapshot) in committed {
            if instruction.is_translation() {
                assert_eq!(snapshot.direction, previous.direction, "{instruction}");
            } else {
                assert_eq!(snapshot.position, previous.position, "{instruction}");
            }
            previous = snapshot.clone();
        }
        assert_eq!(report.commits.len(), program.len());
    }

    #[test]
    fn commit_count_matches_executed_instructions() {
        let level = level_from(vec![vec![2, 1, 1, 4]], Direction::East);
        let mut session = instant(level);
        let report = session.run_to_completion(&[Move, TurnLeft, TurnRight, Move, Move, Move]);
        assert_eq!(report.outcome, RunOutcome::lost(LossReason::HitWall));
        assert_eq!(report.commits.len(), 4);
        let frames = 1 + report.commits.len();
        let observed = report
            .events
            .iter()
            .filter(|event| matches!(event, RunEvent::Started(_) | RunEvent::Committed { .. }))
            .count();
        assert_eq!(observed, frames);
    }

    #[test]
    fn suspensions_follow_the_step_contract() {
        let timing = RunTiming::default();
        let mut session = RunSession::new(corridor(), timing);

        let started = session.start(&[TurnLeft, Move]);
        assert!(matches!(started.event, RunEvent::Started(_)));
        assert_eq!(started.resume_after, timing.reset_delay);

        let mut trace = Vec::new();
        while let Some(suspension) = session.resume() {
            trace.push((suspension.event.name(), suspension.resume_after));
        }
        assert_eq!(
            trace,
            vec![
                ("committed", Duration::from_millis(160)),
                ("settled", Duration::from_millis(640)),
                ("finished", Duration::ZERO),
            ]
        );
    }

    #[test]
    fn completed_run_waits_post_run_settle_before_outcome() {
        let timing = RunTiming::default();
        let mut session = RunSession::new(corridor(), timing);
        session.start(&[Move, Move]);
        let mut names = Vec::new();
        let mut completed_wait = None;
        while let Some(suspension) = session.resume() {
            if let RunEvent::Completed(snapshot) = &suspension.event {
                assert_eq!(snapshot.active_index, Some(1));
                assert_eq!(snapshot.status, RunStatus::Running);
                completed_wait = Some(suspension.resume_after);
            }
            if let RunEvent::Finished { snapshot, .. } = &suspension.event {
                assert_eq!(snapshot.active_index, None);
                assert_eq!(snapshot.status, RunStatus::Won);
            }
            names.push(suspension.event.name());
        }
        assert_eq!(completed_wait, Some(timing.post_run_settle));
        assert_eq!(
            names,
            vec!["committed", "settled", "committed", "settled", "completed", "finished"]
        );
    }

    #[test]
    fn collection_happens_after_arrival_not_at_commit() {
        let mut session = RunSession::new(corridor(), RunTiming::default());
        session.start(&[Move, Move]);
        let events = std::iter::from_fn(|| session.resume())
            .map(|suspension| suspension.event)
            .collect::<Vec<_>>();

        let RunEvent::Committed { snapshot, .. } = &events[2] else {
            panic!("expected commit, got {:?}", events[2]);
        };
        assert_eq!(snapshot.position, GridPos::new(3, 1));
        assert!(snapshot.collected.is_empty());

        let RunEvent::Settled {
            collected,
            snapshot,
            ..
        } = &events[3]
        else {
            panic!("expected settle, got {:?}", events[3]);
        };
        assert_eq!(*collected, Some(GridPos::new(3, 1)));
        assert_eq!(snapshot.collected.len(), 1);
    }

    #[test]
    fn jump_flag_is_visible_until_next_instruction() {
        let mut session = instant(level_from(vec![vec![2, 0, 1, 3]], Direction::East));
        let report = session.run_to_completion(&[Jump, Move]);
        let flags = report
            .events
            .iter()
            .map(|event| (event.name(), event.snapshot().is_jumping))
            .collect::<Vec<_>>();
        assert_eq!(
            flags,
            vec![
                ("started", false),
                ("committed", true),
                ("settled", true),
                ("committed", false),
                ("settled", false),
                ("completed", false),
                ("finished", false),
            ]
        );
    }

    #[test]
    fn fatal_step_has_no_suspension() {
        let mut session = RunSession::new(corridor(), RunTiming::default());
        let report = session.run_to_completion(&[TurnLeft, Move]);
        let last = report.events.last().expect("event");
        assert!(matches!(
            last,
            RunEvent::Finished {
                outcome: RunOutcome {
                    reason: Some(LossReason::FellIntoVoid),
                    ..
                },
                ..
            }
        ));
        // reset handshake + one turn; the fatal move adds nothing.
        assert_eq!(
            report.scheduled_duration,
            Duration::from_millis(100 + 800)
        );
    }

    #[test]
    fn reset_restores_start_from_any_state() {
        let level = corridor();
        let mut session = instant(level.clone());
        let initial = session.reset();
        assert_eq!(initial.position, level.start());
        assert_eq!(initial.direction, Direction::East);
        assert!(initial.collected.is_empty());

        session.run_to_completion(&[Move, Move]);
        let after_win = session.reset();
        assert_eq!(after_win.position, level.start());
        assert_eq!(after_win.status, RunStatus::Idle);
        assert!(after_win.collected.is_empty());

        session.run_to_completion(&[TurnLeft, Move]);
        let after_loss = session.reset();
        assert_eq!(after_loss.position, level.start());
        assert_eq!(after_loss.direction, Direction::East);

        session.start(&[TurnLeft, TurnLeft]);
        session.resume();
        assert!(session.is_running());
        let mid_run = session.reset();
        assert!(!session.is_running());
        assert_eq!(mid_run.direction, Direction::East);
        assert_eq!(session.resume(), None);
    }

    #[test]
    fn reset_twice_is_identical() {
        let mut session = instant(corridor());
        session.run_to_completion(&[Move]);
        let first = session.reset();
        let second = session.reset();
        assert_eq!(first, second);
    }

    #[test]
    fn restarting_supersedes_the_previous_run() {
        let mut session = RunSession::new(corridor(), RunTiming::default());
        let first = session.start(&[TurnLeft, TurnLeft, TurnLeft]);
        let first_id = first.event.snapshot().run_id;
        session.resume();
        session.resume();

        let second = session.start(&[Move, Move]);
        let second_id = second.event.snapshot().run_id;
        assert!(second_id > first_id);
        assert_eq!(second.event.snapshot().active_index, None);

        let mut previous_index = None;
        while let Some(suspension) = session.resume() {
            let snapshot = suspension.event.snapshot();
            assert_eq!(snapshot.run_id, second_id);
            if let Some(index) = snapshot.active_index {
                assert!(previous_index.map_or(true, |previous| index >= previous));
                previous_index = Some(index);
            }
        }
        assert_eq!(session.outcome(), Some(RunOutcome::won()));
    }

    #[test]
    fn loading_a_level_resets_onto_it() {
        let mut session = instant(corridor());
        session.run_to_completion(&[Move]);
        let other = level_from(vec![vec![0, 0], vec![2, 3]], Direction::North);
        let snapshot = session.load_level(other.clone());
        assert_eq!(snapshot.position, GridPos::new(0, 1));
        assert_eq!(snapshot.direction, Direction::North);
        assert_eq!(session.level(), &other);
    }
}
