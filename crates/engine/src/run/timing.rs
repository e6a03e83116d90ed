use std::time::Duration;

pub const DEFAULT_STEP_DURATION: Duration = Duration::from_millis(800);
pub const DEFAULT_ARRIVAL_FRACTION: f32 = 0.2;
pub const DEFAULT_POST_RUN_SETTLE: Duration = Duration::from_millis(500);
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_millis(100);

/// Suspension lengths for a run.
///
/// Each instruction occupies one `step`: the first `arrival_fraction` of it
/// passes between commit and the collection check, the rest before the next
/// instruction starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunTiming {
    pub step: Duration,
    pub arrival_fraction: f32,
    pub post_run_settle: Duration,
    pub reset_delay: Duration,
}

impl Default for RunTiming {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP_DURATION,
            arrival_fraction: DEFAULT_ARRIVAL_FRACTION,
            post_run_settle: DEFAULT_POST_RUN_SETTLE,
            reset_delay: DEFAULT_RESET_DELAY,
        }
    }
}

impl RunTiming {
    pub fn with_step(step: Duration) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    /// No waiting at all; used for headless evaluation.
    pub fn instant() -> Self {
        Self {
            step: Duration::ZERO,
            arrival_fraction: DEFAULT_ARRIVAL_FRACTION,
            post_run_settle: Duration::ZERO,
            reset_delay: Duration::ZERO,
        }
    }

    pub fn arrival_delay(&self) -> Duration {
        let fraction = if self.arrival_fraction.is_finite() {
            self.arrival_fraction.clamp(0.0, 1.0)
        } else {
            DEFAULT_ARRIVAL_FRACTION
        };
        // Per-mille integer math keeps 20% of 800ms at exactly 160ms.
        let permille = (fraction * 1000.0).round() as u128;
        let nanos = self.step.as_nanos() * permille / 1000;
        Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
    }

    pub fn settle_delay(&self) -> Duration {
        self.step.saturating_sub(self.arrival_delay())
    }

    /// Wall time of a run that executes `instruction_count` blocks without dying.
    pub fn full_run_duration(&self, instruction_count: usize) -> Duration {
        self.reset_delay
            .saturating_add(
                self.step
                    .saturating_mul(u32::try_from(instruction_count).unwrap_or(u32::MAX)),
            )
            .saturating_add(self.post_run_settle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_step_splits_twenty_eighty() {
        let timing = RunTiming::default();
        assert_eq!(timing.arrival_delay(), Duration::from_millis(160));
        assert_eq!(timing.settle_delay(), Duration::from_millis(640));
    }

    #[test]
    fn arrival_fraction_is_clamped() {
        let timing = RunTiming {
            arrival_fraction: 3.0,
            ..RunTiming::with_step(Duration::from_millis(100))
        };
        assert_eq!(timing.arrival_delay(), Duration::from_millis(100));
        assert_eq!(timing.settle_delay(), Duration::ZERO);

        let timing = RunTiming {
            arrival_fraction: f32::NAN,
            ..RunTiming::with_step(Duration::from_millis(100))
        };
        assert_eq!(timing.arrival_delay(), Duration::from_millis(20));
    }

    #[test]
    fn instant_timing_never_waits() {
        let timing = RunTiming::instant();
        assert_eq!(timing.arrival_delay(), Duration::ZERO);
        assert_eq!(timing.settle_delay(), Duration::ZERO);
        assert_eq!(timing.full_run_duration(10), Duration::ZERO);
    }

    #[test]
    fn full_run_duration_adds_handshake_and_settle() {
        let timing = RunTiming::default();
        assert_eq!(timing.full_run_duration(2), Duration::from_millis(100 + 1600 + 500));
    }

    #[test]
    fn full_run_duration_saturates_huge_block_counts() {
        let timing = RunTiming::default();
        let capped = timing.full_run_duration(u32::MAX as usize);
        assert_eq!(
            timing.full_run_duration((u32::MAX as usize).saturating_add(1)),
            capped
        );
        assert!(capped > timing.full_run_duration(1));
    }
}
