pub mod cli;
pub mod config;
pub mod engine;
pub mod exclude;
pub mod models;
pub mod profile;
pub mod resolver;
pub mod utils;
pub mod walker;

pub use cli::run;
pub use config::{ConfigError, IndexerConfig};
pub use engine::Indexer;
pub use exclude::{Decision, ExclusionFilter};
pub use models::{BuildMode, BuildReport, RunOutcome};
pub use walker::{CorpusWalker, WalkEvent};
