use std::time::Duration;

use super::session::{RunEvent, RunSession};
use super::state::Snapshot;
use crate::world::Instruction;

/// Feeds a `RunSession` from a fixed-timestep loop.
///
/// `update` spends the elapsed time on pending suspensions and hands back
/// every event whose wait has run out, oldest first.
#[derive(Debug, Clone)]
pub struct RunDriver {
    session: RunSession,
    pending_wait: Duration,
}

impl RunDriver {
    pub fn new(session: RunSession) -> Self {
        Self {
            session,
            pending_wait: Duration::ZERO,
        }
    }

    pub fn session(&self) -> &RunSession {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    /// Time until the next event can fire, if a run is in flight.
    pub fn time_until_next_event(&self) -> Option<Duration> {
        self.session.is_running().then_some(self.pending_wait)
    }

    pub fn start(&mut self, instructions: &[Instruction]) -> Snapshot {
        let started = self.session.start(instructions);
        self.pending_wait = started.resume_after;
        started.event.snapshot().clone()
    }

    pub fn reset(&mut self) -> Snapshot {
        self.pending_wait = Duration::ZERO;
        self.session.reset()
    }

    pub fn update(&mut self, dt: Duration) -> Vec<RunEvent> {
        let mut events = Vec::new();
        let mut budget = dt;

        while self.session.is_running() {
            if self.pending_wait > budget {
                self.pending_wait -= budget;
                break;
            }
            budget -= self.pending_wait;
            self.pending_wait = Duration::ZERO;

            match self.session.resume() {
                Some(suspension) => {
                    self.pending_wait = suspension.resume_after;
                    events.push(suspension.event);
                }
                None => break,
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::state::{RunOutcome, RunStatus};
    use crate::run::timing::RunTiming;
    use crate::world::{Direction, Level, LevelDefinition, LevelId};

    fn corridor() -> Level {
        Level::from_definition(LevelDefinition {
            id: LevelId::Number(1),
            name: "driver".to_string(),
            description: String::new(),
            grid: vec![vec![2, 1, 3]],
            start_dir: Direction::East,
            par: 2,
        })
        .expect("level")
    }

    fn names(events: &[RunEvent]) -> Vec<&'static str> {
        events.iter().map(RunEvent::name).collect()
    }

    #[test]
    fn events_fire_only_after_their_wait() {
        let mut driver = RunDriver::new(RunSession::new(corridor(), RunTiming::default()));
        let started = driver.start(&[Instruction::Move, Instruction::Move]);
        assert_eq!(started.status, RunStatus::Running);

        assert!(driver.update(Duration::from_millis(99)).is_empty());
        assert_eq!(
            names(&driver.update(Duration::from_millis(1))),
            vec!["committed"]
        );
        assert!(driver.update(Duration::from_millis(159)).is_empty());
        assert_eq!(
            names(&driver.update(Duration::from_millis(1))),
            vec!["settled"]
        );
        assert_eq!(
            driver.time_until_next_event(),
            Some(Duration::from_millis(640))
        );
    }

    #[test]
    fn large_steps_drain_events_in_order() {
        let timing = RunTiming::default();
        let mut driver = RunDriver::new(RunSession::new(corridor(), timing));
        driver.start(&[Instruction::Move, Instruction::Move]);

        let events = driver.update(timing.full_run_duration(2));
        assert_eq!(
            names(&events),
            vec!["committed", "settled", "committed", "settled", "completed", "finished"]
        );
        assert!(!driver.is_running());
        assert_eq!(driver.session().outcome(), Some(RunOutcome::won()));
        assert!(driver.update(Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn finished_run_is_not_reported_before_post_run_settle() {
        let timing = RunTiming::default();
        let mut driver = RunDriver::new(RunSession::new(corridor(), timing));
        driver.start(&[Instruction::Move]);

        let almost = timing.full_run_duration(1) - Duration::from_millis(1);
        let events = driver.update(almost);
        assert_eq!(names(&events), vec!["committed", "settled", "completed"]);
        assert_eq!(
            names(&driver.update(Duration::from_millis(1))),
            vec!["finished"]
        );
    }

    #[test]
    fn reset_mid_run_stops_all_further_events() {
        let mut driver = RunDriver::new(RunSession::new(corridor(), RunTiming::default()));
        driver.start(&[Instruction::Move, Instruction::Move]);
        driver.update(Duration::from_millis(150));

        let snapshot = driver.reset();
        assert_eq!(snapshot.status, RunStatus::Idle);
        assert_eq!(driver.time_until_next_event(), None);
        assert!(driver.update(Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn restart_discards_pending_wait_of_old_run() {
        let mut driver = RunDriver::new(RunSession::new(corridor(), RunTiming::default()));
        let first = driver.start(&[Instruction::TurnLeft]);
        driver.update(Duration::from_millis(300));

        let second = driver.start(&[Instruction::Move]);
        assert!(second.run_id > first.run_id);
        assert_eq!(
            driver.time_until_next_event(),
            Some(Duration::from_millis(100))
        );
        let events = driver.update(Duration::from_millis(100));
        assert_eq!(names(&events), vec!["committed"]);
        assert_eq!(events[0].snapshot().run_id, second.run_id);
    }
}
