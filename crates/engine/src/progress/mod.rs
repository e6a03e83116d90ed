mod atomic_io;
mod campaign;
mod generator;
mod store;

pub use campaign::{Campaign, CampaignError};
pub use generator::{parse_generated_level, GeneratorError, LevelGenerator};
pub use store::{
    report_progress, JsonProgressStore, LevelResult, ProgressError, ProgressFile, ProgressSink,
    PROGRESS_FORMAT_VERSION,
};
