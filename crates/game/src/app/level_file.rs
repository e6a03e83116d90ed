use std::fs;
use std::path::Path;

use engine::{parse_generated_level, GeneratorError, LevelDefinition, LevelGenerator};
use serde::Deserialize;
use tracing::info;

pub(crate) type LevelFileResult<T> = Result<T, String>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelPack {
    levels: Vec<LevelDefinition>,
}

/// Reads a level file. It holds either one level object or `{"levels": [...]}`.
pub(crate) fn load_level_definitions(path: &Path) -> LevelFileResult<Vec<LevelDefinition>> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("read level file {}: {error}", path.display()))?;
    let definitions = parse_level_file_json(&raw)
        .map_err(|error| format!("level file {}: {error}", path.display()))?;
    info!(path = %path.display(), levels = definitions.len(), "level_file_loaded");
    Ok(definitions)
}

fn parse_level_file_json(raw: &str) -> LevelFileResult<Vec<LevelDefinition>> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|source| format!("parse level json: {source}"))?;
    if value.get("levels").is_some() {
        let pack: LevelPack = deserialize_with_path(value)?;
        if pack.levels.is_empty() {
            return Err("level pack has no levels".to_string());
        }
        Ok(pack.levels)
    } else {
        Ok(vec![deserialize_with_path(value)?])
    }
}

fn deserialize_with_path<T>(value: serde_json::Value) -> LevelFileResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    serde_path_to_error::deserialize::<_, T>(value).map_err(|error| {
        let path = error.path().to_string();
        let source = error.into_inner();
        if path.is_empty() || path == "." {
            format!("parse level json: {source}")
        } else {
            format!("parse level json at {path}: {source}")
        }
    })
}

/// Level generator backed by a reply captured on disk.
pub(crate) struct ReplyFileGenerator<'a> {
    path: &'a Path,
}

impl<'a> ReplyFileGenerator<'a> {
    pub(crate) fn new(path: &'a Path) -> Self {
        Self { path }
    }
}

impl LevelGenerator for ReplyFileGenerator<'_> {
    fn generate(&mut self, prompt: &str) -> Result<LevelDefinition, GeneratorError> {
        info!(path = %self.path.display(), prompt = %prompt, "reading_generated_level");
        let raw = fs::read_to_string(self.path).map_err(|error| {
            GeneratorError::Unavailable(format!("read {}: {error}", self.path.display()))
        })?;
        parse_generated_level(&raw)
    }
}
