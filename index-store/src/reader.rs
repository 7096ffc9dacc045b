use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::format::{self, FileRecord, IndexData, PathBytes};

/// A read-only view of a complete artifact.
#[derive(Debug, Clone)]
pub struct Index {
    data: IndexData,
}

impl Index {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = format::decode(path.as_ref())?;
        Ok(Self { data })
    }

    /// The indexed roots, in sorted order.
    pub fn roots(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.data.roots.iter().map(PathBytes::to_path_buf)
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.data.files
    }

    pub fn contains_file(&self, path: &Path) -> bool {
        let key = PathBytes::from_path(path);
        self.data
            .files
            .binary_search_by(|record| record.path.cmp(&key))
            .is_ok()
    }

    /// Paths of the files containing `trigram`.
    pub fn files_with_trigram(&self, trigram: u32) -> Vec<PathBuf> {
        match self
            .data
            .postings
            .binary_search_by_key(&trigram, |posting| posting.trigram)
        {
            Ok(pos) => self.data.postings[pos]
                .files
                .iter()
                .filter_map(|id| self.data.files.get(*id as usize))
                .map(|record| record.path.to_path_buf())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub(crate) fn into_data(self) -> IndexData {
        self.data
    }
}
