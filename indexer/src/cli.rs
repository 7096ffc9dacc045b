use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing::info;

use crate::config::{ConfigError, IndexerConfig};
use crate::engine::Indexer;
use crate::models::RunOutcome;
use crate::profile::CpuProfile;
use crate::utils;

const LONG_ABOUT: &str = "\
cindex prepares the trigram index used by code search. The index is the file
named by $CSEARCHINDEX, or else $HOME/.csearchindex.

`cindex path...` adds the file or directory tree named by each path to the
index. Run with no paths, it reindexes the paths that have already been added,
in case the files have changed, which makes plain `cindex` a good nightly job.

By default cindex adds the named paths to the index but preserves information
about other paths that might already be indexed (the ones printed by --list).
--reset discards the existing index before indexing the new paths. With no
path arguments, --reset removes the index.

Options take the double-dash spelling: --list, --reset, --verbose (or -v),
--cpuprofile PATH, --exclude REGEX and --index PATH. Single-dash forms such
as -list are not accepted.";

#[derive(Debug, Parser)]
#[command(
    name = "cindex",
    version,
    about = "Build and incrementally update a trigram code search index",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    /// List indexed paths and exit.
    #[arg(long)]
    pub list: bool,
    /// Discard the existing index.
    #[arg(long)]
    pub reset: bool,
    /// Log skipped files and directories (use -vv for trace level).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    /// Write a CPU profile to this file.
    #[arg(long = "cpuprofile", value_name = "PATH")]
    pub cpu_profile: Option<PathBuf>,
    /// Regex of directory paths to skip, in addition to the built-in set.
    #[arg(long = "exclude", value_name = "REGEX")]
    pub exclude: Vec<String>,
    /// Index file to use instead of $CSEARCHINDEX or ~/.csearchindex.
    #[arg(long = "index", value_name = "PATH")]
    pub index: Option<PathBuf>,
    /// Files or directory trees to (re)index.
    pub paths: Vec<PathBuf>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    utils::init_tracing(cli.verbose)?;

    let index_path = match &cli.index {
        Some(path) => utils::absolutize(path)?,
        None => cindex_store::default_index_path().map_err(ConfigError::from)?,
    };

    let config = IndexerConfig::new(index_path, cli.paths)
        .list(cli.list)
        .reset(cli.reset)
        .verbose(cli.verbose > 0)
        .exclude(cli.exclude);
    let indexer = Indexer::new(config)?;

    let _profile = cli
        .cpu_profile
        .as_deref()
        .map(CpuProfile::start)
        .transpose()?;

    let started = Instant::now();
    match indexer.run()? {
        RunOutcome::Listed(roots) => {
            let mut out = io::stdout().lock();
            for root in roots {
                writeln!(out, "{}", root.display())?;
            }
        }
        RunOutcome::Removed { existed } => {
            info!(index = %indexer.config().index_path.display(), existed, "reset");
        }
        RunOutcome::Built(report) => {
            let elapsed = Duration::from_millis(started.elapsed().as_millis() as u64);
            info!(
                mode = %report.mode,
                index = %report.index_path.display(),
                roots = report.roots.len(),
                files = report.files_indexed,
                skipped = report.files_skipped,
                excluded = report.entries_excluded,
                trigrams = report.trigrams,
                errors = report.errors,
                elapsed = %humantime::format_duration(elapsed),
                "done"
            );
        }
    }

    Ok(())
}
