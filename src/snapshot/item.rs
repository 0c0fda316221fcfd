use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bincode::{Decode, Encode};

/// A node of the snapshot tree.
///
/// Files are nodes without children whose size is the file length. Directories hold their
/// entries keyed by absolute path, and their size is the sum of those entries' sizes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode)]
pub struct FileSystemItem {
    total_size: i64,
    children: BTreeMap<PathBuf, FileSystemItem>,
}

impl FileSystemItem {
    pub fn file(size: i64) -> Self {
        Self {
            total_size: size,
            children: BTreeMap::new(),
        }
    }

    /// Creates a directory node and computes its size from the given entries.
    pub fn directory<P, I>(children: I) -> Self
    where
        P: Into<PathBuf>,
        I: IntoIterator<Item = (P, FileSystemItem)>,
    {
        let children: BTreeMap<PathBuf, FileSystemItem> = children
            .into_iter()
            .map(|(path, item)| (path.into(), item))
            .collect();
        let total_size = children
            .values()
            .map(FileSystemItem::total_size)
            .fold(0, i64::saturating_add);

        Self {
            total_size,
            children,
        }
    }

    pub fn total_size(&self) -> i64 {
        self.total_size
    }

    pub fn children(&self) -> &BTreeMap<PathBuf, FileSystemItem> {
        &self.children
    }

    pub fn child(&self, path: impl AsRef<Path>) -> Option<&FileSystemItem> {
        self.children.get(path.as_ref())
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes below this one.
    pub fn entry_count(&self) -> usize {
        self.children
            .values()
            .map(|child| 1 + child.entry_count())
            .sum()
    }

    /// Checks that no size is negative and that every directory's size equals the sum of
    /// its entries, recursively.
    pub fn is_consistent(&self) -> bool {
        if self.total_size < 0 {
            return false;
        }
        if self.children.is_empty() {
            return true;
        }

        let sum = self
            .children
            .values()
            .try_fold(0i64, |sum, child| sum.checked_add(child.total_size));
        sum == Some(self.total_size) && self.children.values().all(FileSystemItem::is_consistent)
    }

    pub(super) fn set_size(&mut self, size: i64) {
        self.total_size = size;
    }

    pub(super) fn child_mut(&mut self, path: PathBuf) -> &mut FileSystemItem {
        self.children.entry(path).or_default()
    }

    /// Recomputes directory sizes bottom-up. Leaves keep their own size.
    pub(super) fn aggregate(&mut self) -> i64 {
        if !self.children.is_empty() {
            self.total_size = self
                .children
                .values_mut()
                .map(FileSystemItem::aggregate)
                .fold(0, i64::saturating_add);
        }
        self.total_size
    }
}
