use serde::Deserialize;
use thiserror::Error;

use crate::world::{Direction, LevelDefinition, LevelId};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("level generator unavailable: {0}")]
    Unavailable(String),
    #[error("level generator returned malformed data: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// External producer of new levels from a free-form description.
///
/// Whatever it returns is validated by the campaign before use.
pub trait LevelGenerator {
    fn generate(&mut self, prompt: &str) -> Result<LevelDefinition, GeneratorError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedLevelReply {
    name: String,
    #[serde(default)]
    description: String,
    grid: Vec<Vec<u8>>,
    start_dir: Direction,
    #[serde(default)]
    par: u32,
}

/// Parses a generator's JSON reply. Replies carry no id; the campaign assigns one.
pub fn parse_generated_level(reply: &str) -> Result<LevelDefinition, GeneratorError> {
    let reply: GeneratedLevelReply =
        serde_json::from_str(reply).map_err(GeneratorError::Malformed)?;
    Ok(LevelDefinition {
        id: LevelId::Name(String::new()),
        name: reply.name,
        description: reply.description,
        grid: reply.grid,
        start_dir: reply.start_dir,
        par: reply.par,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_without_id_parses_with_blank_id() {
        let reply = r#"{"name":"Spiral","description":"hard","grid":[[2,1,3]],"startDir":1,"par":2}"#;
        let definition = parse_generated_level(reply).expect("definition");
        assert_eq!(definition.id, LevelId::Name(String::new()));
        assert_eq!(definition.start_dir, Direction::East);
        assert_eq!(definition.grid, vec![vec![2, 1, 3]]);
    }

    #[test]
    fn malformed_reply_is_reported() {
        let err = parse_generated_level(r#"{"name":"x","grid":"nope","startDir":1}"#)
            .expect_err("malformed");
        assert!(matches!(err, GeneratorError::Malformed(_)));
    }
}
