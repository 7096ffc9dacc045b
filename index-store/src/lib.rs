//! On-disk trigram index artifacts: creation, reading and merging.
//!
//! An artifact records the roots that were indexed, the files found under
//! them and a trigram posting list per file. Artifacts are only ever written
//! to a path in full and then renamed into place, so a reader never observes
//! a partially written index.

pub mod error;
pub mod format;
pub mod location;
pub mod merge;
pub mod publish;
pub mod reader;
pub mod trigram;
pub mod writer;

pub use error::{Result, StoreError};
pub use format::{FileRecord, PathBytes};
pub use location::{default_index_path, merge_path, staging_path};
pub use merge::merge;
pub use publish::publish;
pub use reader::Index;
pub use writer::{AddOutcome, IndexWriter, SkipReason, WriterStats};
