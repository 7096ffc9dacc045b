//! Artifact encoding: an 8 byte magic header followed by a zstd-compressed
//! JSON document.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

pub const MAGIC: &[u8; 8] = b"cindex\x00\x01";
pub const FORMAT_VERSION: u32 = 2;
const ZSTD_LEVEL: i32 = 3;

/// A path stored as its raw OS bytes, so names that are not valid UTF-8
/// survive the round trip. Ordering is byte-wise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathBytes(#[serde(with = "serde_bytes")] Vec<u8>);

impl PathBytes {
    #[cfg(unix)]
    pub fn from_path(path: &Path) -> Self {
        use std::os::unix::ffi::OsStrExt;
        Self(path.as_os_str().as_bytes().to_vec())
    }

    #[cfg(not(unix))]
    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned().into_bytes())
    }

    #[cfg(unix)]
    pub fn to_path_buf(&self) -> PathBuf {
        use std::os::unix::ffi::OsStrExt;
        PathBuf::from(std::ffi::OsStr::from_bytes(&self.0))
    }

    #[cfg(not(unix))]
    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(String::from_utf8_lossy(&self.0).into_owned())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBytes,
    pub size: u64,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub trigram: u32,
    pub files: Vec<u32>,
}

/// The decoded contents of an artifact. Roots and files are sorted by path;
/// posting lists are sorted by trigram and reference files by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexData {
    pub version: u32,
    pub roots: Vec<PathBytes>,
    pub files: Vec<FileRecord>,
    pub postings: Vec<Posting>,
}

/// Encodes `data` into `file`, flushing and syncing it to disk.
pub(crate) fn encode_into(file: &File, data: &IndexData, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(file);
    writer
        .write_all(MAGIC)
        .map_err(|err| StoreError::io(path, err))?;

    let mut encoder =
        zstd::Encoder::new(&mut writer, ZSTD_LEVEL).map_err(|err| StoreError::io(path, err))?;
    serde_json::to_writer(&mut encoder, data).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    encoder.finish().map_err(|err| StoreError::io(path, err))?;

    writer.flush().map_err(|err| StoreError::io(path, err))?;
    drop(writer);
    file.sync_all().map_err(|err| StoreError::io(path, err))?;
    Ok(())
}

pub(crate) fn decode(path: &Path) -> Result<IndexData> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        Err(err) => return Err(StoreError::io(path, err)),
    };
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 8];
    match reader.read_exact(&mut magic) {
        Ok(()) if &magic == MAGIC => {}
        Ok(()) => return Err(StoreError::BadMagic { path: path.to_path_buf() }),
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(StoreError::BadMagic { path: path.to_path_buf() });
        }
        Err(err) => return Err(StoreError::io(path, err)),
    }

    let decoder = zstd::Decoder::with_buffer(reader).map_err(|err| StoreError::io(path, err))?;
    let data: IndexData = serde_json::from_reader(decoder).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    if data.version != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: data.version,
        });
    }
    Ok(data)
}
