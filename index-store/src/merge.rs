use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::format::{self, FORMAT_VERSION, FileRecord, IndexData, PathBytes, Posting};
use crate::reader::Index;

/// Combines `old` and `new` into a fresh artifact at `output`.
///
/// Files from `new` always win. A file from `old` survives only when it does
/// not lie under one of `new`'s roots, because those roots were re-walked and
/// anything missing from `new` under them has been deleted or excluded since.
/// Neither input is modified.
pub fn merge(output: &Path, old: &Path, new: &Path) -> Result<()> {
    let old = Index::open(old)?.into_data();
    let new = Index::open(new)?.into_data();
    let merged = merge_data(old, new);

    let file = File::create(output).map_err(|err| StoreError::io(output, err))?;
    format::encode_into(&file, &merged, output)?;

    debug!(
        output = %output.display(),
        roots = merged.roots.len(),
        files = merged.files.len(),
        "merged index written"
    );
    Ok(())
}

fn merge_data(old: IndexData, new: IndexData) -> IndexData {
    let mut roots: Vec<PathBytes> = old.roots.iter().chain(new.roots.iter()).cloned().collect();
    roots.sort();
    roots.dedup();

    let new_roots: Vec<PathBuf> = new.roots.iter().map(PathBytes::to_path_buf).collect();
    let keep_old: Vec<bool> = old
        .files
        .iter()
        .map(|record| {
            let path = record.path.to_path_buf();
            !new_roots.iter().any(|root| is_under(&path, root))
        })
        .collect();

    // Both inputs are sorted by path; walk them together so the output is too.
    let mut files: Vec<FileRecord> = Vec::with_capacity(old.files.len() + new.files.len());
    let mut old_ids = vec![None; old.files.len()];
    let mut new_ids = vec![0u32; new.files.len()];
    let (mut i, mut j) = (0, 0);
    while i < old.files.len() || j < new.files.len() {
        if i < old.files.len() && !keep_old[i] {
            i += 1;
            continue;
        }
        let take_old = match (old.files.get(i), new.files.get(j)) {
            (Some(o), Some(n)) => o.path < n.path,
            (Some(_), None) => true,
            _ => false,
        };
        if take_old {
            old_ids[i] = Some(files.len() as u32);
            files.push(old.files[i].clone());
            i += 1;
        } else {
            if old.files.get(i).is_some_and(|o| o.path == new.files[j].path) {
                i += 1;
            }
            new_ids[j] = files.len() as u32;
            files.push(new.files[j].clone());
            j += 1;
        }
    }

    let mut postings: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for posting in old.postings {
        let ids: Vec<u32> = posting
            .files
            .iter()
            .filter_map(|id| old_ids.get(*id as usize).copied().flatten())
            .collect();
        if !ids.is_empty() {
            postings.entry(posting.trigram).or_default().extend(ids);
        }
    }
    for posting in new.postings {
        postings
            .entry(posting.trigram)
            .or_default()
            .extend(posting.files.iter().filter_map(|id| new_ids.get(*id as usize).copied()));
    }

    let postings = postings
        .into_iter()
        .map(|(trigram, mut files)| {
            files.sort_unstable();
            files.dedup();
            Posting { trigram, files }
        })
        .collect();

    IndexData {
        version: FORMAT_VERSION,
        roots,
        files,
        postings,
    }
}

fn is_under(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}
