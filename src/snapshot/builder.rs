use std::path::{Path, PathBuf};

use snafu::IntoError;
use snafu::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::ext::BestEffortPathExt;
use crate::snapshot::{FileSystemItem, Snapshot};

/// Result of walking a live directory.
#[derive(Debug)]
pub struct WalkOutcome {
    pub snapshot: Snapshot,
    /// Entries that could not be read. Their subtrees count as empty.
    pub partial_failures: Vec<PartialWalkFailure>,
}

impl WalkOutcome {
    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }
}

impl Snapshot {
    /// Walks `root` and records the size of every file and directory below it.
    ///
    /// The root is resolved to an absolute, canonical path first, which also verifies that
    /// it exists. Entries that become unreadable during the walk are skipped and reported in
    /// [`WalkOutcome::partial_failures`] instead of failing the whole snapshot.
    pub fn create(root: impl AsRef<Path>) -> Result<WalkOutcome, SnapshotCreationError> {
        let root = root.as_ref();
        let root_path = root.canonicalize().context(InvalidRootSnafu {
            path: root.to_path_buf(),
        })?;
        ensure!(
            root_path.is_dir(),
            NotADirectorySnafu {
                path: root_path.clone()
            }
        );

        info!("Taking snapshot of {}", root_path.display());
        let (root, partial_failures) = walk(&root_path);
        info!(
            "Snapshot of {} complete: {} entries, {} bytes, {} skipped",
            root_path.display(),
            root.entry_count(),
            root.total_size(),
            partial_failures.len()
        );

        Ok(WalkOutcome {
            snapshot: Snapshot { root_path, root },
            partial_failures,
        })
    }

    /// Builds the size tree of an existing, absolute directory path without validating it.
    pub fn build_tree(root: &Path) -> FileSystemItem {
        walk(root).0
    }
}

fn walk(root: &Path) -> (FileSystemItem, Vec<PartialWalkFailure>) {
    let mut tree = FileSystemItem::default();
    let mut partial_failures = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                let failure = PartialWalkFailure::from_walk_error(source);
                warn!("{failure}");
                partial_failures.push(failure);
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            node_at(&mut tree, root, entry.path());
        } else if file_type.is_file() {
            let size = match entry.metadata() {
                Ok(metadata) => i64::try_from(metadata.len()).unwrap_or(i64::MAX),
                Err(source) => {
                    let failure = PartialWalkFailure::from_walk_error(source);
                    warn!("{failure}");
                    partial_failures.push(failure);
                    continue;
                }
            };
            if let Some(node) = node_at(&mut tree, root, entry.path()) {
                node.set_size(size);
            }
        } else {
            debug!("Skipping non-regular entry {}", entry.path().display());
        }
    }

    tree.aggregate();
    (tree, partial_failures)
}

/// Finds or creates the node for `path`, creating missing intermediate directories.
fn node_at<'a>(
    tree: &'a mut FileSystemItem,
    root: &Path,
    path: &Path,
) -> Option<&'a mut FileSystemItem> {
    let relative = path.strip_prefix(root).ok()?;

    let mut key = root.to_path_buf();
    let mut current = tree;
    for component in relative.components() {
        key.push(component);
        current = current.child_mut(key.clone());
    }
    Some(current)
}

/// An entry the walk could not read.
#[derive(Debug, Snafu)]
#[snafu(display("Skipped unreadable entry {}", describe_path(path.as_deref())))]
pub struct PartialWalkFailure {
    path: Option<PathBuf>,
    source: walkdir::Error,
}

impl PartialWalkFailure {
    fn from_walk_error(source: walkdir::Error) -> Self {
        PartialWalkFailureSnafu {
            path: source.path().map(Path::to_path_buf),
        }
        .into_error(source)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn describe_path(path: Option<&Path>) -> String {
    path.map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}

#[derive(Debug, Snafu)]
pub enum SnapshotCreationError {
    #[snafu(display("Cannot resolve snapshot root {}", path.best_effort_path_display()))]
    InvalidRoot {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Snapshot root {} is not a directory", path.display()))]
    NotADirectory { path: PathBuf },
}
