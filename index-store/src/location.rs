use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

pub const INDEX_ENV: &str = "CSEARCHINDEX";
pub const DEFAULT_INDEX_NAME: &str = ".csearchindex";

/// Resolves the master index location: `$CSEARCHINDEX`, else
/// `$HOME/.csearchindex`.
pub fn default_index_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(INDEX_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().ok_or(StoreError::NoHomeDir)?;
    Ok(home.join(DEFAULT_INDEX_NAME))
}

/// Where an incremental run builds its new artifact before merging.
pub fn staging_path(master: &Path) -> PathBuf {
    with_suffix(master, "~")
}

/// Where the merged artifact is written before it replaces the master.
pub fn merge_path(master: &Path) -> PathBuf {
    with_suffix(master, "~~")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
