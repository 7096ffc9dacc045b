use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// The new artifact replaces the master outright.
    Reset,
    /// The new artifact is merged with the master, keeping roots this run
    /// did not touch.
    Incremental,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Reset => f.write_str("reset"),
            BuildMode::Incremental => f.write_str("incremental"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub mode: BuildMode,
    pub index_path: PathBuf,
    pub roots: Vec<PathBuf>,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub entries_excluded: usize,
    pub errors: usize,
    /// Distinct trigrams in the artifact this run wrote, before any merge.
    pub trigrams: usize,
}

impl BuildReport {
    pub(crate) fn new(mode: BuildMode, index_path: PathBuf) -> Self {
        Self {
            mode,
            index_path,
            roots: Vec::new(),
            files_indexed: 0,
            files_skipped: 0,
            entries_excluded: 0,
            errors: 0,
            trigrams: 0,
        }
    }
}

/// What a single invocation did.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Listed(Vec<PathBuf>),
    Removed { existed: bool },
    Built(BuildReport),
}
