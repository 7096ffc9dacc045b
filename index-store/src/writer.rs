use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::format::{self, FORMAT_VERSION, FileRecord, IndexData, PathBytes, Posting};
use crate::publish;
use crate::trigram::{self, MAX_FILE_LEN, Rejection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Duplicate,
    TooLarge(u64),
    Binary,
    InvalidUtf8,
    LongLine,
    TooManyTrigrams(usize),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Duplicate => write!(f, "already indexed"),
            SkipReason::TooLarge(size) => write!(f, "too long, ignoring ({size} bytes)"),
            SkipReason::Binary => write!(f, "binary file"),
            SkipReason::InvalidUtf8 => write!(f, "invalid UTF-8, ignoring"),
            SkipReason::LongLine => write!(f, "very long lines, ignoring"),
            SkipReason::TooManyTrigrams(n) => write!(f, "too many trigrams ({n}), probably not text, ignoring"),
        }
    }
}

impl From<Rejection> for SkipReason {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Binary => SkipReason::Binary,
            Rejection::InvalidUtf8 => SkipReason::InvalidUtf8,
            Rejection::LongLine => SkipReason::LongLine,
            Rejection::TooManyTrigrams(n) => SkipReason::TooManyTrigrams(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Indexed,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub roots: usize,
    pub files: usize,
    pub skipped: usize,
    pub trigrams: usize,
}

/// Builds a new artifact destined for `target`.
///
/// Content accumulates in memory and in a temp file beside the target; the
/// target path itself only changes when [`IndexWriter::finalize`] renames the
/// completed artifact onto it.
pub struct IndexWriter {
    target: PathBuf,
    temp: NamedTempFile,
    verbose: bool,
    roots: Vec<PathBytes>,
    files: Vec<FileRecord>,
    seen: HashSet<PathBytes>,
    postings: BTreeMap<u32, Vec<u32>>,
    skipped: usize,
}

impl IndexWriter {
    pub fn create(target: impl Into<PathBuf>) -> Result<Self> {
        let target = target.into();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = target
            .file_name()
            .map(|name| format!("{}.", name.to_string_lossy()))
            .unwrap_or_else(|| ".cindex.".to_string());

        let temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|err| StoreError::io(&target, err))?;

        debug!(target = %target.display(), temp = %temp.path().display(), "created index writer");

        Ok(Self {
            target,
            temp,
            verbose: false,
            roots: Vec::new(),
            files: Vec::new(),
            seen: HashSet::new(),
            postings: BTreeMap::new(),
            skipped: 0,
        })
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn add_root(&mut self, root: &Path) {
        self.roots.push(PathBytes::from_path(root));
    }

    /// Reads `path` and adds its trigrams. Content that does not look like
    /// text is skipped rather than rejected; only I/O failures are errors.
    pub fn add_file(&mut self, path: &Path) -> Result<AddOutcome> {
        let name = PathBytes::from_path(path);
        if self.seen.contains(&name) {
            return Ok(self.skip(path, SkipReason::Duplicate));
        }

        let mut file = File::open(path).map_err(|err| StoreError::io(path, err))?;
        let size = file
            .metadata()
            .map_err(|err| StoreError::io(path, err))?
            .len();
        if size > MAX_FILE_LEN {
            return Ok(self.skip(path, SkipReason::TooLarge(size)));
        }

        let mut content = Vec::with_capacity(size as usize);
        file.read_to_end(&mut content)
            .map_err(|err| StoreError::io(path, err))?;

        let trigrams = match trigram::extract(&content) {
            Ok(trigrams) => trigrams,
            Err(rejection) => return Ok(self.skip(path, rejection.into())),
        };

        let id = self.files.len() as u32;
        for t in trigrams {
            self.postings.entry(t).or_default().push(id);
        }
        self.seen.insert(name.clone());
        self.files.push(FileRecord {
            path: name,
            size: content.len() as u64,
            hash: hex::encode(Sha256::digest(&content)),
        });

        Ok(AddOutcome::Indexed)
    }

    fn skip(&mut self, path: &Path, reason: SkipReason) -> AddOutcome {
        self.skipped += 1;
        if self.verbose {
            info!(path = %path.display(), %reason, "skipping file");
        } else {
            debug!(path = %path.display(), %reason, "skipping file");
        }
        AddOutcome::Skipped(reason)
    }

    /// Encodes the artifact, syncs it to disk and renames it onto the
    /// target path.
    pub fn finalize(self) -> Result<WriterStats> {
        let IndexWriter {
            target,
            temp,
            mut roots,
            files,
            postings,
            skipped,
            ..
        } = self;

        roots.sort();
        roots.dedup();

        let mut ordered: Vec<(usize, FileRecord)> = files.into_iter().enumerate().collect();
        ordered.sort_by(|a, b| a.1.path.cmp(&b.1.path));

        let mut remap = vec![0u32; ordered.len()];
        for (new_id, (old_id, _)) in ordered.iter().enumerate() {
            remap[*old_id] = new_id as u32;
        }
        let files: Vec<FileRecord> = ordered.into_iter().map(|(_, record)| record).collect();

        let postings: Vec<Posting> = postings
            .into_iter()
            .map(|(trigram, ids)| {
                let mut files: Vec<u32> = ids.into_iter().map(|id| remap[id as usize]).collect();
                files.sort_unstable();
                Posting { trigram, files }
            })
            .collect();

        let stats = WriterStats {
            roots: roots.len(),
            files: files.len(),
            skipped,
            trigrams: postings.len(),
        };

        let data = IndexData {
            version: FORMAT_VERSION,
            roots,
            files,
            postings,
        };

        format::encode_into(temp.as_file(), &data, &target)?;
        temp.persist(&target)
            .map_err(|err| StoreError::io(&target, err.error))?;
        publish::sync_parent_dir(&target)?;

        debug!(
            target = %target.display(),
            roots = stats.roots,
            files = stats.files,
            trigrams = stats.trigrams,
            "index written"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::reader::Index;

    #[test]
    fn finalize_sorts_files_and_roots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("src");
        fs::create_dir(&src).expect("mkdir");
        fs::write(src.join("b.txt"), "hello world\n").expect("write");
        fs::write(src.join("a.txt"), "another file\n").expect("write");

        let target = dir.path().join("index");
        let mut writer = IndexWriter::create(&target).expect("create");
        writer.add_root(&src);
        writer.add_root(dir.path());
        assert_eq!(writer.add_file(&src.join("b.txt")).expect("add"), AddOutcome::Indexed);
        assert_eq!(writer.add_file(&src.join("a.txt")).expect("add"), AddOutcome::Indexed);
        let stats = writer.finalize().expect("finalize");
        assert_eq!(stats.files, 2);
        assert_eq!(stats.roots, 2);

        let index = Index::open(&target).expect("open");
        let files: Vec<PathBuf> = index.files().iter().map(|f| f.path.to_path_buf()).collect();
        let a = src.join("a.txt");
        let b = src.join("b.txt");
        assert_eq!(files, vec![a.clone(), b.clone()]);
        assert!(index.contains_file(&a));
        assert!(!index.contains_file(&src.join("c.txt")));

        let roots: Vec<PathBuf> = index.roots().collect();
        assert_eq!(roots, vec![dir.path().to_path_buf(), src.clone()]);

        let hits = index.files_with_trigram(trigram::pack(b'w', b'o', b'r'));
        assert_eq!(hits, vec![b]);
    }

    #[test]
    fn skips_binary_and_duplicate_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bin = dir.path().join("blob.bin");
        let txt = dir.path().join("notes.txt");
        fs::write(&bin, [1u8, 0, 2, 3]).expect("write");
        fs::write(&txt, "plain text").expect("write");

        let mut writer = IndexWriter::create(dir.path().join("index")).expect("create");
        assert_eq!(
            writer.add_file(&bin).expect("add"),
            AddOutcome::Skipped(SkipReason::Binary)
        );
        assert_eq!(writer.add_file(&txt).expect("add"), AddOutcome::Indexed);
        assert_eq!(
            writer.add_file(&txt).expect("add"),
            AddOutcome::Skipped(SkipReason::Duplicate)
        );
        let stats = writer.finalize().expect("finalize");
        assert_eq!(stats.files, 1);
        assert_eq!(stats.skipped, 2);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = IndexWriter::create(dir.path().join("index")).expect("create");
        let err = writer
            .add_file(&dir.path().join("missing.txt"))
            .expect_err("should fail");
        assert!(matches!(err, StoreError::Io { .. }), "{err}");
    }

    #[test]
    fn target_untouched_until_finalize() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("index");
        let writer = IndexWriter::create(&target).expect("create");
        assert!(!target.exists());
        drop(writer);
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn create_fails_when_directory_is_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = IndexWriter::create(dir.path().join("nope").join("index"));
        assert!(err.is_err());
    }
}
