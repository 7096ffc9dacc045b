use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::utils;

/// Canonicalizes `raw` and returns the result sorted byte-wise with adjacent
/// duplicates removed. Paths that cannot be resolved are reported and
/// dropped; they never fail the run.
pub fn resolve_roots<P: AsRef<Path>>(raw: &[P]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = raw
        .iter()
        .filter_map(|path| {
            let path: &Path = path.as_ref();
            match fs::canonicalize(path) {
                Ok(resolved) => Some(resolved),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unresolvable path");
                    None
                }
            }
        })
        .collect();

    roots.sort_by(|a, b| utils::lexical_cmp(a, b));
    roots.dedup();
    roots
}
