mod driver;
mod session;
mod state;
mod timing;

pub use driver::RunDriver;
pub use session::{RunEvent, RunReport, RunSession, Suspension};
pub use state::{
    check_landing, LossReason, RunId, RunOutcome, RunState, RunStatus, Snapshot,
    FALLBACK_LOSS_MESSAGE, WIN_MESSAGE,
};
pub use timing::{
    RunTiming, DEFAULT_ARRIVAL_FRACTION, DEFAULT_POST_RUN_SETTLE, DEFAULT_RESET_DELAY,
    DEFAULT_STEP_DURATION,
};
