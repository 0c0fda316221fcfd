//! Snapshot data model, builder, differ and on-disk codec.
//!
//! A snapshot is built once by walking a live directory (or decoded from a saved file)
//! and is read-only afterwards. Every node in the tree is keyed by its absolute path,
//! so a key is unique across the whole tree and can be reported to the user as-is.

mod builder;
mod codec;
mod differ;
mod item;

use std::path::{Path, PathBuf};

use bincode::{Decode, Encode};

pub use builder::{PartialWalkFailure, SnapshotCreationError, WalkOutcome};
pub use codec::{
    LoadError, SNAPSHOT_EXTENSION, SaveError, SnapshotDecodingError, SnapshotEncodingError,
};
pub use differ::{Change, CompareError};
pub use item::FileSystemItem;

/// Point-in-time size map of a directory tree together with the path it was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode)]
pub struct Snapshot {
    root_path: PathBuf,
    root: FileSystemItem,
}

impl Snapshot {
    /// Assembles a snapshot from an already built tree.
    pub fn from_parts(root_path: impl Into<PathBuf>, root: FileSystemItem) -> Self {
        Self {
            root_path: root_path.into(),
            root,
        }
    }

    /// The directory this snapshot was taken from.
    pub fn path(&self) -> &Path {
        &self.root_path
    }

    pub fn root(&self) -> &FileSystemItem {
        &self.root
    }

    pub fn total_size(&self) -> i64 {
        self.root.total_size()
    }
}
