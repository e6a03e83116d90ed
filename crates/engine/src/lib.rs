use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod program;
pub mod progress;
pub mod run;
pub mod world;

pub use program::{render_solution_report, Block, Program, ProgramParseError};
pub use progress::{
    parse_generated_level, report_progress, Campaign, CampaignError, GeneratorError,
    JsonProgressStore, LevelGenerator, LevelResult, ProgressError, ProgressFile, ProgressSink,
    PROGRESS_FORMAT_VERSION,
};
pub use run::{
    check_landing, LossReason, RunDriver, RunEvent, RunId, RunOutcome, RunReport, RunSession,
    RunState, RunStatus, RunTiming, Snapshot, Suspension, DEFAULT_ARRIVAL_FRACTION,
    DEFAULT_POST_RUN_SETTLE, DEFAULT_RESET_DELAY, DEFAULT_STEP_DURATION, FALLBACK_LOSS_MESSAGE,
    WIN_MESSAGE,
};
pub use world::{
    builtin_level_definitions, resolve, Candidate, CellType, Direction, Grid, GridError, GridPos,
    Instruction, InvalidDirection, Level, LevelDefinition, LevelError, LevelId,
};

pub const HOME_ENV_VAR: &str = "CUBEBOT_HOME";
const DEFAULT_DATA_DIR_NAME: &str = ".cubebot";
const PROGRESS_FILE_NAME: &str = "progress.json";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub progress_file: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error("failed to create data directory at {path}: {source}")]
    CreateDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves where progress lives: `$CUBEBOT_HOME`, or `.cubebot` under the
/// current directory. The directory is created if missing.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let data_dir = resolve_data_dir()?;
    fs::create_dir_all(&data_dir).map_err(|source| StartupError::CreateDataDir {
        path: data_dir.clone(),
        source,
    })?;
    Ok(app_paths_in(&data_dir))
}

fn app_paths_in(data_dir: &Path) -> AppPaths {
    let data_dir = normalize_path(data_dir);
    AppPaths {
        progress_file: data_dir.join(PROGRESS_FILE_NAME),
        data_dir,
    }
}

fn resolve_data_dir() -> Result<PathBuf, StartupError> {
    match env::var(HOME_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => Ok(PathBuf::from(value.trim())),
        Ok(_) | Err(env::VarError::NotPresent) => env::current_dir()
            .map(|cwd| cwd.join(DEFAULT_DATA_DIR_NAME))
            .map_err(StartupError::CurrentDir),
        Err(source) => Err(StartupError::EnvVar {
            var: HOME_ENV_VAR,
            source,
        }),
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
