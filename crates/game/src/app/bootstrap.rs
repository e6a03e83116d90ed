use std::env;
use std::time::Duration;

use engine::RunTiming;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub(crate) const STEP_MS_ENV_VAR: &str = "CUBEBOT_STEP_MS";

/// Pacing of the terminal playback loop.
#[derive(Debug, Clone)]
pub(crate) struct LoopConfig {
    pub(crate) target_tps: u32,
    pub(crate) max_frame_delta: Duration,
    pub(crate) max_ticks_per_frame: u32,
    pub(crate) timing: RunTiming,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            timing: RunTiming::default(),
        }
    }
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// Builds the loop config. `--instant` wins over everything, then the
/// `--step-ms` flag, then `CUBEBOT_STEP_MS`, then the default step.
pub(crate) fn build_loop_config(step_ms_flag: Option<u64>, instant: bool) -> LoopConfig {
    let env_step_ms = env::var(STEP_MS_ENV_VAR).ok();
    let timing = resolve_run_timing(step_ms_flag, env_step_ms.as_deref(), instant);
    info!(
        step_ms = timing.step.as_millis() as u64,
        arrival_ms = timing.arrival_delay().as_millis() as u64,
        instant,
        "run_timing"
    );
    LoopConfig {
        timing,
        ..LoopConfig::default()
    }
}

fn resolve_run_timing(
    step_ms_flag: Option<u64>,
    env_step_ms: Option<&str>,
    instant: bool,
) -> RunTiming {
    if instant {
        return RunTiming::instant();
    }
    if let Some(ms) = step_ms_flag {
        return RunTiming::with_step(Duration::from_millis(ms));
    }
    match env_step_ms.map(str::trim) {
        Some(value) => match value.parse::<u64>() {
            Ok(ms) => RunTiming::with_step(Duration::from_millis(ms)),
            Err(_) => {
                warn!(
                    env_var = STEP_MS_ENV_VAR,
                    value = %value,
                    "invalid step env var value; falling back to default"
                );
                RunTiming::default()
            }
        },
        None => RunTiming::default(),
    }
}
