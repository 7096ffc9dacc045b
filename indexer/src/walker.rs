use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::exclude::{Decision, ExclusionFilter};

/// One step of a corpus walk.
#[derive(Debug)]
pub enum WalkEvent {
    /// A regular file that passed the filter.
    File(PathBuf),
    /// An entry the filter rejected. For directories nothing beneath it is
    /// visited.
    Skipped { path: PathBuf, decision: Decision },
    /// The walk could not read an entry; the walk continues past it.
    Error(walkdir::Error),
}

/// Depth-first walk of one root, yielding regular files in file-name order.
///
/// Symlinks, sockets, devices and other special files are dropped silently.
pub struct CorpusWalker<'a> {
    filter: &'a ExclusionFilter,
    inner: walkdir::IntoIter,
}

impl<'a> CorpusWalker<'a> {
    pub fn new(root: &Path, filter: &'a ExclusionFilter) -> Self {
        let inner = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        Self { filter, inner }
    }

    /// Iterates only the files, discarding skip and error events.
    pub fn files(self) -> impl Iterator<Item = PathBuf> + 'a {
        self.filter_map(|event| match event {
            WalkEvent::File(path) => Some(path),
            _ => None,
        })
    }
}

impl Iterator for CorpusWalker<'_> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(WalkEvent::Error(err)),
            };

            let file_type = entry.file_type();
            let decision = self.filter.classify(entry.path(), file_type.is_dir());
            if !decision.is_include() {
                if file_type.is_dir() {
                    self.inner.skip_current_dir();
                }
                return Some(WalkEvent::Skipped {
                    path: entry.into_path(),
                    decision,
                });
            }

            if file_type.is_file() {
                return Some(WalkEvent::File(entry.into_path()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::exclude::Cause;

    fn tree() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("repo");
        fs::create_dir_all(root.join("src/nested")).expect("mkdir");
        fs::create_dir_all(root.join("node_modules/dep")).expect("mkdir");
        fs::create_dir_all(root.join(".git/objects")).expect("mkdir");
        fs::write(root.join("README.md"), "readme").expect("write");
        fs::write(root.join("src/main.rs"), "fn main() {}").expect("write");
        fs::write(root.join("src/nested/lib.rs"), "pub fn f() {}").expect("write");
        fs::write(root.join("src/main.rs~"), "backup").expect("write");
        fs::write(root.join("node_modules/dep/index.js"), "x").expect("write");
        fs::write(root.join(".git/objects/abc"), "obj").expect("write");
        (dir, root)
    }

    #[test]
    fn yields_included_regular_files_depth_first() {
        let (_dir, root) = tree();
        let filter = ExclusionFilter::new(&[]).expect("filter");
        let files: Vec<PathBuf> = CorpusWalker::new(&root, &filter).files().collect();
        assert_eq!(
            files,
            vec![
                root.join("README.md"),
                root.join("src/main.rs"),
                root.join("src/nested/lib.rs"),
            ]
        );
    }

    #[test]
    fn pruned_directories_are_reported_once_and_never_entered() {
        let (_dir, root) = tree();
        let filter = ExclusionFilter::new(&[]).expect("filter");
        let skipped: Vec<(PathBuf, Decision)> = CorpusWalker::new(&root, &filter)
            .filter_map(|event| match event {
                WalkEvent::Skipped { path, decision } => Some((path, decision)),
                _ => None,
            })
            .collect();

        assert_eq!(
            skipped,
            vec![
                (root.join(".git"), Decision::SkipSubtree(Cause::Pattern(0))),
                (root.join("node_modules"), Decision::SkipSubtree(Cause::Pattern(1))),
                (root.join("src/main.rs~"), Decision::SkipEntry(Cause::Hidden)),
            ]
        );
    }

    #[test]
    fn missing_root_is_an_error_event() {
        let dir = tempfile::tempdir().expect("tempdir");
        let filter = ExclusionFilter::empty();
        let events: Vec<WalkEvent> = CorpusWalker::new(&dir.path().join("absent"), &filter).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], WalkEvent::Error(_)));
    }

    #[test]
    fn single_file_root_yields_itself() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("notes.txt");
        fs::write(&file, "hi").expect("write");
        let filter = ExclusionFilter::empty();
        let files: Vec<PathBuf> = CorpusWalker::new(&file, &filter).files().collect();
        assert_eq!(files, vec![file]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_does_not_stop_the_walk() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("repo");
        fs::create_dir_all(root.join("locked")).expect("mkdir");
        fs::write(root.join("a.txt"), "a").expect("write");
        fs::write(root.join("locked/inner.txt"), "inner").expect("write");
        fs::write(root.join("z.txt"), "z").expect("write");

        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");
        if fs::read_dir(&locked).is_ok() {
            // Permission bits do not bind this user (e.g. root).
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("chmod");
            return;
        }

        let filter = ExclusionFilter::new(&[]).expect("filter");
        let events: Vec<WalkEvent> = CorpusWalker::new(&root, &filter).collect();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("chmod");

        let files: Vec<&PathBuf> = events
            .iter()
            .filter_map(|event| match event {
                WalkEvent::File(path) => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(files, vec![&root.join("a.txt"), &root.join("z.txt")]);

        let errors: Vec<&walkdir::Error> = events
            .iter()
            .filter_map(|event| match event {
                WalkEvent::Error(err) => Some(err),
                _ => None,
            })
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path(), Some(locked.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_omitted() {
        let (_dir, root) = tree();
        std::os::unix::fs::symlink(root.join("README.md"), root.join("link.md")).expect("symlink");
        std::os::unix::fs::symlink(root.join("src"), root.join("srclink")).expect("symlink");
        let filter = ExclusionFilter::new(&[]).expect("filter");
        let files: Vec<PathBuf> = CorpusWalker::new(&root, &filter).files().collect();
        assert!(!files.contains(&root.join("link.md")));
        assert!(!files.iter().any(|f| f.starts_with(root.join("srclink"))));
        assert_eq!(files.len(), 3);
    }
}
