use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cindex_store::{AddOutcome, Index, IndexWriter, StoreError};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, IndexerConfig};
use crate::exclude::{Decision, ExclusionFilter};
use crate::models::{BuildMode, BuildReport, RunOutcome};
use crate::resolver;
use crate::walker::{CorpusWalker, WalkEvent};

/// Drives one invocation: listing the index, removing it, or building and
/// publishing a new one.
///
/// The master index is only ever replaced by renaming a complete artifact
/// onto it, so an error at any point leaves the previous index readable.
pub struct Indexer {
    config: IndexerConfig,
    filter: ExclusionFilter,
}

impl Indexer {
    /// Compiles the exclusion patterns up front so a bad pattern fails
    /// before the filesystem is touched.
    pub fn new(config: IndexerConfig) -> Result<Self, ConfigError> {
        let filter = ExclusionFilter::new(&config.exclude)?;
        Ok(Self { config, filter })
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn run(&self) -> Result<RunOutcome> {
        if self.config.list {
            return self.list().map(RunOutcome::Listed);
        }
        if self.config.reset && self.config.paths.is_empty() {
            return self.remove();
        }
        self.build().map(RunOutcome::Built)
    }

    /// The roots recorded in the master index. A missing index lists as empty.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        match Index::open(&self.config.index_path) {
            Ok(index) => Ok(index.roots().collect()),
            Err(err) if err.is_not_found() => {
                info!(index = %self.config.index_path.display(), "no index");
                Ok(Vec::new())
            }
            Err(err) => Err(err).context("failed to open index"),
        }
    }

    fn remove(&self) -> Result<RunOutcome> {
        let master = &self.config.index_path;
        match fs::remove_file(master) {
            Ok(()) => {
                info!(index = %master.display(), "index removed");
                Ok(RunOutcome::Removed { existed: true })
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(index = %master.display(), "no index to remove");
                Ok(RunOutcome::Removed { existed: false })
            }
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove index {}", master.display()))
            }
        }
    }

    fn build(&self) -> Result<BuildReport> {
        let master = self.config.index_path.as_path();

        let requested = if self.config.paths.is_empty() {
            self.recorded_roots()?
        } else {
            self.config.paths.clone()
        };
        let roots = resolver::resolve_roots(&requested);
        if roots.is_empty() {
            warn!("none of the requested paths could be resolved");
        }

        let mode = if self.config.reset || !master.exists() {
            BuildMode::Reset
        } else {
            BuildMode::Incremental
        };
        let staging = match mode {
            BuildMode::Reset => master.to_path_buf(),
            BuildMode::Incremental => cindex_store::staging_path(master),
        };

        let mut writer = IndexWriter::create(&staging)
            .with_context(|| format!("failed to create index {}", staging.display()))?;
        writer.set_verbose(self.config.verbose);

        let mut report = BuildReport::new(mode, master.to_path_buf());
        for root in &roots {
            writer.add_root(root);
        }
        for root in &roots {
            info!(root = %root.display(), "index");
            self.index_root(root, &mut writer, &mut report);
        }
        report.roots = roots;

        info!(index = %staging.display(), "flush index");
        let stats = writer
            .finalize()
            .with_context(|| format!("failed to write index {}", staging.display()))?;
        report.trigrams = stats.trigrams;

        if mode == BuildMode::Incremental {
            self.merge_into_master(master, &staging)?;
        }

        Ok(report)
    }

    fn recorded_roots(&self) -> Result<Vec<PathBuf>> {
        match Index::open(&self.config.index_path) {
            Ok(index) => Ok(index.roots().collect()),
            Err(StoreError::NotFound(path)) => Err(ConfigError::NothingToIndex(path).into()),
            Err(err) => Err(err).context("failed to read indexed roots"),
        }
    }

    fn index_root(&self, root: &Path, writer: &mut IndexWriter, report: &mut BuildReport) {
        for event in CorpusWalker::new(root, &self.filter) {
            match event {
                WalkEvent::File(path) => match writer.add_file(&path) {
                    Ok(AddOutcome::Indexed) => report.files_indexed += 1,
                    Ok(AddOutcome::Skipped(_)) => report.files_skipped += 1,
                    Err(err) => {
                        warn!(error = %err, "failed to index file");
                        report.errors += 1;
                    }
                },
                WalkEvent::Skipped { path, decision } => {
                    report.entries_excluded += 1;
                    self.log_skip(&path, decision);
                }
                WalkEvent::Error(err) => {
                    warn!(path = ?err.path(), error = %err, "walk error");
                    report.errors += 1;
                }
            }
        }
    }

    fn log_skip(&self, path: &Path, decision: Decision) {
        let (kind, cause) = match decision {
            Decision::SkipSubtree(cause) => ("dir", cause),
            Decision::SkipEntry(cause) => ("file", cause),
            Decision::Include => return,
        };
        let rule = self.filter.describe(cause);
        if self.config.verbose {
            info!(path = %path.display(), kind, rule, "skipping");
        } else {
            debug!(path = %path.display(), kind, rule, "skipping");
        }
    }

    /// Merges the finalized staging artifact with the master into a second
    /// temp file, then renames that over the master.
    fn merge_into_master(&self, master: &Path, staging: &Path) -> Result<()> {
        let merged = cindex_store::merge_path(master);
        info!(master = %master.display(), staging = %staging.display(), "merge");

        cindex_store::merge(&merged, master, staging)
            .with_context(|| format!("failed to merge into {}", merged.display()))?;
        cindex_store::publish(&merged, master).with_context(|| {
            format!("failed to replace {} with {}", master.display(), merged.display())
        })?;

        if let Err(err) = fs::remove_file(staging) {
            warn!(path = %staging.display(), error = %err, "failed to remove staging index");
        }
        Ok(())
    }
}
