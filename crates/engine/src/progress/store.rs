use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::atomic_io::replace_file_contents;
use crate::program::{Block, Program};
use crate::world::{Level, LevelId};

pub const PROGRESS_FORMAT_VERSION: u32 = 1;

/// One solved level, as handed to a progress sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelResult {
    pub level_id: LevelId,
    pub level_name: String,
    pub fingerprint: String,
    pub solution: Vec<Block>,
    pub recorded_at_unix_secs: u64,
}

impl LevelResult {
    pub fn new(level: &Level, program: &Program) -> Self {
        let recorded_at_unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Self {
            level_id: level.id().clone(),
            level_name: level.name().to_string(),
            fingerprint: level.fingerprint(),
            solution: program.blocks().to_vec(),
            recorded_at_unix_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("failed to read progress file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write progress file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("progress file {path} is not valid json: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode progress file {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("progress file {path} has format version {actual}, expected {expected}")]
    FormatVersion {
        path: PathBuf,
        expected: u32,
        actual: u32,
    },
    #[error("progress sink rejected result: {0}")]
    Rejected(String),
}

/// Destination for solved-level records.
pub trait ProgressSink {
    fn record(&mut self, result: &LevelResult) -> Result<(), ProgressError>;
}

/// Hands `result` to `sink`; a failure is logged and reported as `false`.
///
/// Persistence is best effort. Play continues whether or not it worked.
pub fn report_progress(sink: &mut dyn ProgressSink, result: &LevelResult) -> bool {
    match sink.record(result) {
        Ok(()) => {
            info!(level = %result.level_id, blocks = result.solution.len(), "progress_saved");
            true
        }
        Err(error) => {
            warn!(level = %result.level_id, error = %error, "progress_save_failed");
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressFile {
    pub format_version: u32,
    #[serde(default)]
    pub earned: Vec<LevelId>,
    #[serde(default)]
    pub results: Vec<LevelResult>,
}

impl Default for ProgressFile {
    fn default() -> Self {
        Self {
            format_version: PROGRESS_FORMAT_VERSION,
            earned: Vec::new(),
            results: Vec::new(),
        }
    }
}

/// Progress kept in a local JSON file.
#[derive(Debug, Clone)]
pub struct JsonProgressStore {
    path: PathBuf,
    file: ProgressFile,
}

impl JsonProgressStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ProgressError> {
        let path = path.into();
        let file = match fs::read_to_string(&path) {
            Ok(raw) => Self::decode(&path, &raw)?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => ProgressFile::default(),
            Err(source) => return Err(ProgressError::Read { path, source }),
        };
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn earned(&self) -> &[LevelId] {
        &self.file.earned
    }

    pub fn results(&self) -> &[LevelResult] {
        &self.file.results
    }

    pub fn save(&self) -> Result<(), ProgressError> {
        let text =
            serde_json::to_string_pretty(&self.file).map_err(|source| ProgressError::Encode {
                path: self.path.clone(),
                source,
            })?;
        replace_file_contents(&self.path, &text).map_err(|source| ProgressError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn decode(path: &Path, raw: &str) -> Result<ProgressFile, ProgressError> {
        let file: ProgressFile =
            serde_json::from_str(raw).map_err(|source| ProgressError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        if file.format_version != PROGRESS_FORMAT_VERSION {
            return Err(ProgressError::FormatVersion {
                path: path.to_path_buf(),
                expected: PROGRESS_FORMAT_VERSION,
                actual: file.format_version,
            });
        }
        Ok(file)
    }
}

impl ProgressSink for JsonProgressStore {
    fn record(&mut self, result: &LevelResult) -> Result<(), ProgressError> {
        if !self.file.earned.contains(&result.level_id) {
            self.file.earned.push(result.level_id.clone());
        }
        // One result per level; a repeat win replaces the older solution.
        match self
            .file
            .results
            .iter_mut()
            .find(|existing| existing.level_id == result.level_id)
        {
            Some(existing) => *existing = result.clone(),
            None => self.file.results.push(result.clone()),
        }
        self.save()
    }
}
