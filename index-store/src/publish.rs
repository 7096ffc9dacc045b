use std::fs;
use std::path::Path;

use crate::error::{Result, StoreError};

/// Atomically replaces `to` with `from`. Both paths must be on the same
/// filesystem.
pub fn publish(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|err| StoreError::io(to, err))?;
    sync_parent_dir(to)
}

/// Makes a completed rename in the parent directory durable.
#[cfg(unix)]
pub fn sync_parent_dir(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = fs::File::open(parent).map_err(|err| StoreError::io(parent, err))?;
    dir.sync_all().map_err(|err| StoreError::io(parent, err))
}

#[cfg(not(unix))]
pub fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}
