use std::thread;
use std::time::{Duration, Instant};

use engine::{Instruction, RunDriver, RunEvent, RunOutcome, Snapshot};
use tracing::{info, warn};

use super::bootstrap::LoopConfig;

/// Source of frame time for the playback loop.
pub(crate) trait FramePacer {
    /// Blocks until roughly `target` has passed and returns the real elapsed time.
    fn wait_frame(&mut self, target: Duration) -> Duration;
}

pub(crate) struct RealtimePacer {
    last_frame: Instant,
}

impl RealtimePacer {
    pub(crate) fn new() -> Self {
        Self {
            last_frame: Instant::now(),
        }
    }
}

impl FramePacer for RealtimePacer {
    fn wait_frame(&mut self, target: Duration) -> Duration {
        let elapsed = Instant::now().saturating_duration_since(self.last_frame);
        if elapsed < target {
            thread::sleep(target - elapsed);
        }
        let now = Instant::now();
        let frame_dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        frame_dt
    }
}

/// Advances time by exactly the requested amount without sleeping.
pub(crate) struct SimulatedPacer;

impl FramePacer for SimulatedPacer {
    fn wait_frame(&mut self, target: Duration) -> Duration {
        target
    }
}

/// Plays `instructions` to the end on fixed ticks, handing every snapshot to
/// `on_snapshot` as soon as the run publishes it.
pub(crate) fn run_program(
    driver: &mut RunDriver,
    instructions: &[Instruction],
    config: &LoopConfig,
    pacer: &mut dyn FramePacer,
    on_event: &mut dyn FnMut(&RunEvent),
) -> RunOutcome {
    let target_tps = config.target_tps.max(1);
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let max_frame_delta = if config.max_frame_delta.is_zero() {
        Duration::from_millis(250)
    } else {
        config.max_frame_delta
    };
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        blocks = instructions.len(),
        "loop_config"
    );

    let started = driver.start(instructions);
    on_event(&RunEvent::Started(started));

    let mut accumulator = Duration::ZERO;
    let mut ticks = 0u64;
    while driver.is_running() {
        let frame_dt = pacer.wait_frame(fixed_dt).min(max_frame_delta);
        accumulator = accumulator.saturating_add(frame_dt);

        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        for _ in 0..step_plan.ticks_to_run {
            for event in driver.update(fixed_dt) {
                on_event(&event);
            }
            ticks = ticks.saturating_add(1);
        }
        accumulator = step_plan.remaining_accumulator;

        if step_plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }
    }

    let outcome = driver
        .session()
        .outcome()
        .unwrap_or_else(|| final_outcome_fallback(&driver.session().snapshot()));
    info!(ticks, status = ?outcome.status, "playback_finished");
    outcome
}

fn final_outcome_fallback(snapshot: &Snapshot) -> RunOutcome {
    warn!(status = ?snapshot.status, "playback_ended_without_outcome");
    RunOutcome {
        status: snapshot.status,
        reason: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}
