use std::io;
use std::path::PathBuf;

use cindex_store::StoreError;
use thiserror::Error;

/// Failures detected before any index state is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid exclude pattern {pattern:?}: {source}")]
    InvalidExcludePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cannot create cpu profile {}: {source}", path.display())]
    ProfileCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start cpu profiler: {0}")]
    Profiler(String),

    #[error("no paths given and no existing index at {}", .0.display())]
    NothingToIndex(PathBuf),

    #[error("cannot locate index: {0}")]
    IndexLocation(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub index_path: PathBuf,
    pub paths: Vec<PathBuf>,
    pub list: bool,
    pub reset: bool,
    pub verbose: bool,
    pub exclude: Vec<String>,
}

impl IndexerConfig {
    pub fn new(index_path: PathBuf, paths: Vec<PathBuf>) -> Self {
        Self {
            index_path,
            paths,
            list: false,
            reset: false,
            verbose: false,
            exclude: Vec::new(),
        }
    }

    pub fn list(mut self, list: bool) -> Self {
        self.list = list;
        self
    }

    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }
}
