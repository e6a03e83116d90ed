use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{info, warn};

use super::generator::{GeneratorError, LevelGenerator};
use crate::run::RunOutcome;
use crate::world::{builtin_level_definitions, Level, LevelDefinition, LevelError, LevelId};

const GENERATED_ID_PREFIX_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("campaign has no levels")]
    NoLevels,
    #[error("level index {index} does not exist ({count} levels)")]
    UnknownLevel { index: usize, count: usize },
    #[error("level {id} is locked until level {previous} is completed")]
    Locked { id: LevelId, previous: LevelId },
    #[error(transparent)]
    InvalidLevel(#[from] LevelError),
    #[error("level generation failed: {0}")]
    Generation(#[from] GeneratorError),
}

/// Ordered level list with sequential unlocking.
///
/// Level 0 is always open; level N opens once level N-1 has been won.
#[derive(Debug, Clone)]
pub struct Campaign {
    levels: Vec<Level>,
    earned: BTreeSet<LevelId>,
    current: usize,
}

impl Campaign {
    pub fn new(levels: Vec<Level>) -> Result<Self, CampaignError> {
        if levels.is_empty() {
            return Err(CampaignError::NoLevels);
        }
        Ok(Self {
            levels,
            earned: BTreeSet::new(),
            current: 0,
        })
    }

    pub fn from_definitions(definitions: Vec<LevelDefinition>) -> Result<Self, CampaignError> {
        let levels = definitions
            .into_iter()
            .map(Level::from_definition)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(levels)
    }

    pub fn builtin() -> Result<Self, CampaignError> {
        Self::from_definitions(builtin_level_definitions())
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_level(&self) -> &Level {
        &self.levels[self.current]
    }

    pub fn level(&self, index: usize) -> Result<&Level, CampaignError> {
        self.levels.get(index).ok_or(CampaignError::UnknownLevel {
            index,
            count: self.levels.len(),
        })
    }

    pub fn index_of(&self, id: &LevelId) -> Option<usize> {
        self.levels.iter().position(|level| level.id() == id)
    }

    pub fn is_unlocked(&self, index: usize) -> bool {
        match index {
            0 => !self.levels.is_empty(),
            _ => self
                .levels
                .get(index - 1)
                .is_some_and(|previous| self.earned.contains(previous.id()))
                && index < self.levels.len(),
        }
    }

    pub fn is_earned(&self, id: &LevelId) -> bool {
        self.earned.contains(id)
    }

    /// Reapplies previously earned badges, e.g. from a progress file.
    pub fn restore_earned<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = LevelId>,
    {
        self.earned.extend(ids);
    }

    pub fn select(&mut self, index: usize) -> Result<&Level, CampaignError> {
        let level = self.level(index)?;
        if !self.is_unlocked(index) {
            return Err(CampaignError::Locked {
                id: level.id().clone(),
                previous: self.levels[index - 1].id().clone(),
            });
        }
        self.current = index;
        Ok(&self.levels[index])
    }

    /// Records a finished run. Returns `true` when this win earned a new badge.
    pub fn record_outcome(&mut self, id: &LevelId, outcome: &RunOutcome) -> bool {
        if !outcome.is_won() {
            return false;
        }
        let newly_earned = self.earned.insert(id.clone());
        if newly_earned {
            info!(level = %id, earned = self.earned.len(), "level_earned");
        }
        newly_earned
    }

    pub fn is_last_level(&self) -> bool {
        self.current + 1 == self.levels.len()
    }

    /// Every level in the campaign has been won.
    pub fn is_complete(&self) -> bool {
        self.levels
            .iter()
            .all(|level| self.earned.contains(level.id()))
    }

    /// Moves to the next level, wrapping to the first after the last one.
    pub fn advance(&mut self) -> Result<&Level, CampaignError> {
        let next = if self.is_last_level() {
            0
        } else {
            self.current + 1
        };
        self.select(next)
    }

    /// Validates and appends a level that did not ship with the game.
    ///
    /// Blank ids and ids that clash with an existing level are replaced by a
    /// layout-derived `gen-` id. An invalid definition leaves the campaign untouched.
    pub fn add_level(&mut self, definition: LevelDefinition) -> Result<usize, CampaignError> {
        let mut level = Level::from_definition(definition)?;
        let blank_id = matches!(level.id(), LevelId::Name(name) if name.trim().is_empty());
        if blank_id || self.index_of(level.id()).is_some() {
            let fingerprint = level.fingerprint();
            let mut id = format!("gen-{}", &fingerprint[..GENERATED_ID_PREFIX_LEN]);
            let mut suffix = 1u32;
            while self.index_of(&LevelId::Name(id.clone())).is_some() {
                suffix = suffix.saturating_add(1);
                id = format!("gen-{}-{suffix}", &fingerprint[..GENERATED_ID_PREFIX_LEN]);
            }
            let mut definition = level.to_definition();
            definition.id = LevelId::Name(id);
            level = Level::from_definition(definition)?;
        }
        self.levels.push(level);
        Ok(self.levels.len() - 1)
    }

    /// Asks `generator` for a level and makes it current.
    ///
    /// Any failure is reported to the caller and the current level stays in play.
    pub fn generate_level(
        &mut self,
        generator: &mut dyn LevelGenerator,
        prompt: &str,
    ) -> Result<&Level, CampaignError> {
        let result = generator
            .generate(prompt)
            .map_err(CampaignError::from)
            .and_then(|definition| self.add_level(definition));
        match result {
            Ok(index) => {
                self.current = index;
                info!(level = %self.levels[index].id(), index, "generated_level_loaded");
                Ok(&self.levels[index])
            }
            Err(error) => {
                warn!(
                    error = %error,
                    current = %self.current_level().id(),
                    "level_generation_failed"
                );
                Err(error)
            }
        }
    }
}
