use std::path::{Path, PathBuf};

use snafu::prelude::*;
use tracing::debug;

use crate::snapshot::{FileSystemItem, Snapshot};

/// An entry that grew by at least the comparison threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub path: PathBuf,
    pub size_increase: i64,
}

impl Change {
    /// The changed path with `root` stripped, or the full path if it lies outside `root`.
    pub fn relative_to(&self, root: &Path) -> &Path {
        self.path.strip_prefix(root).unwrap_or(&self.path)
    }
}

impl Snapshot {
    /// Lists the entries of `new` that grew by at least `threshold` bytes since `old`.
    ///
    /// Growth is explained as precisely as possible: when a directory grew past the
    /// threshold but none of its entries did on their own, the directory itself is
    /// reported. Otherwise the qualifying entries are reported in its place. Entries that
    /// only exist in `old` are ignored. A threshold below one byte is treated as one byte.
    ///
    /// Changes come out in traversal order; ranking them is up to the caller.
    pub fn compare(
        old: &Snapshot,
        new: &Snapshot,
        threshold: i64,
    ) -> Result<Vec<Change>, CompareError> {
        ensure!(
            old.root_path == new.root_path,
            PathMismatchSnafu {
                old_root: old.root_path.clone(),
                new_root: new.root_path.clone(),
            }
        );

        let threshold = threshold.max(1);
        let changes = compare_items(&old.root, &new.root, threshold, &new.root_path);
        debug!(
            "Compared snapshots of {} with threshold {}: {} changes",
            new.root_path.display(),
            threshold,
            changes.len()
        );
        Ok(changes)
    }
}

fn compare_items(
    old: &FileSystemItem,
    new: &FileSystemItem,
    threshold: i64,
    path: &Path,
) -> Vec<Change> {
    let size_increase = new.total_size().saturating_sub(old.total_size());

    let mut child_reports = Vec::new();
    let mut has_significant_children = false;

    for (child_path, new_child) in new.children() {
        match old.child(child_path) {
            Some(old_child) => {
                let sub_report = compare_items(old_child, new_child, threshold, child_path);
                if !sub_report.is_empty() {
                    has_significant_children = true;
                    child_reports.extend(sub_report);
                }
            }
            None if new_child.total_size() >= threshold => {
                let sub_report = compare_items(
                    &FileSystemItem::default(),
                    new_child,
                    threshold,
                    child_path,
                );
                if sub_report.is_empty() {
                    child_reports.push(Change {
                        path: child_path.clone(),
                        size_increase: new_child.total_size(),
                    });
                } else {
                    child_reports.extend(sub_report);
                }
                has_significant_children = true;
            }
            None => {}
        }
    }

    if size_increase > 0 && size_increase >= threshold && !has_significant_children {
        return vec![Change {
            path: path.to_path_buf(),
            size_increase,
        }];
    }

    child_reports
}

#[derive(Debug, Snafu)]
pub enum CompareError {
    #[snafu(display(
        "Cannot compare snapshots of different directories: {} and {}",
        old_root.display(),
        new_root.display()
    ))]
    PathMismatch { old_root: PathBuf, new_root: PathBuf },
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::*;
    use tempfile::TempDir;

    use super::*;

    const ROOT: &str = "/data";
    const THRESHOLD: i64 = 1024;

    fn snapshot<const N: usize>(entries: [(&str, FileSystemItem); N]) -> Snapshot {
        Snapshot::from_parts(ROOT, FileSystemItem::directory(entries))
    }

    fn dir<const N: usize>(entries: [(&str, i64); N]) -> FileSystemItem {
        FileSystemItem::directory(entries.map(|(path, size)| (path, FileSystemItem::file(size))))
    }

    fn change(path: &str, size_increase: i64) -> Change {
        Change {
            path: PathBuf::from(path),
            size_increase,
        }
    }

    #[test]
    fn identical_snapshots_report_nothing() {
        let old = snapshot([("/data/dir", dir([("/data/dir/a", 5000)]))]);

        let changes = Snapshot::compare(&old, &old.clone(), THRESHOLD).expect("Compare failed");

        assert!(changes.is_empty());
    }

    #[rstest]
    #[case(THRESHOLD, true)]
    #[case(THRESHOLD + 1, true)]
    #[case(THRESHOLD - 1, false)]
    #[case(0, false)]
    #[case(-THRESHOLD, false)]
    fn growth_is_reported_from_threshold_on(#[case] growth: i64, #[case] reported: bool) {
        let base = 10 * THRESHOLD;
        let old = snapshot([("/data/file", FileSystemItem::file(base))]);
        let new = snapshot([("/data/file", FileSystemItem::file(base + growth))]);

        let changes = Snapshot::compare(&old, &new, THRESHOLD).expect("Compare failed");

        if reported {
            assert_eq!(changes, vec![change("/data/file", growth)]);
        } else {
            assert!(changes.is_empty());
        }
    }

    #[test]
    fn significant_child_suppresses_parent() {
        let old = snapshot([("/data/dir", dir([("/data/dir/a", 0), ("/data/dir/b", 0)]))]);
        let new = snapshot([(
            "/data/dir",
            dir([("/data/dir/a", THRESHOLD), ("/data/dir/b", 0)]),
        )]);

        let changes = Snapshot::compare(&old, &new, THRESHOLD).expect("Compare failed");

        assert_eq!(changes, vec![change("/data/dir/a", THRESHOLD)]);
    }

    #[test]
    fn collectively_significant_children_coarsen_to_parent() {
        let old = snapshot([("/data/dir", dir([("/data/dir/a", 10), ("/data/dir/b", 10)]))]);
        let new = snapshot([(
            "/data/dir",
            dir([
                ("/data/dir/a", 10 + THRESHOLD / 2),
                ("/data/dir/b", 10 + THRESHOLD / 2),
            ]),
        )]);

        let changes = Snapshot::compare(&old, &new, THRESHOLD).expect("Compare failed");

        assert_eq!(changes, vec![change("/data/dir", THRESHOLD)]);
    }

    #[test]
    fn child_growth_is_reported_when_parent_shrinks() {
        let old = snapshot([(
            "/data/dir",
            dir([("/data/dir/a", 10), ("/data/dir/b", 3 * THRESHOLD)]),
        )]);
        let new = snapshot([(
            "/data/dir",
            dir([("/data/dir/a", 10 + THRESHOLD), ("/data/dir/b", 0)]),
        )]);

        let changes = Snapshot::compare(&old, &new, THRESHOLD).expect("Compare failed");

        assert_eq!(changes, vec![change("/data/dir/a", THRESHOLD)]);
    }

    #[test]
    fn new_directory_without_qualifying_child_is_reported_whole() {
        let old = snapshot([("/data/keep", FileSystemItem::file(1))]);
        let new = snapshot([
            ("/data/keep", FileSystemItem::file(1)),
            (
                "/data/fresh",
                dir([
                    ("/data/fresh/x", THRESHOLD / 2),
                    ("/data/fresh/y", THRESHOLD / 2),
                ]),
            ),
        ]);

        let changes = Snapshot::compare(&old, &new, THRESHOLD).expect("Compare failed");

        assert_eq!(changes, vec![change("/data/fresh", THRESHOLD)]);
    }

    #[test]
    fn new_directory_is_broken_down_to_qualifying_children() {
        let old = snapshot([]);
        let new = snapshot([(
            "/data/fresh",
            dir([("/data/fresh/big", THRESHOLD), ("/data/fresh/small", 1)]),
        )]);

        let changes = Snapshot::compare(&old, &new, THRESHOLD).expect("Compare failed");

        assert_eq!(changes, vec![change("/data/fresh/big", THRESHOLD)]);
    }

    #[test]
    fn small_new_entries_are_ignored() {
        let old = snapshot([]);
        let new = snapshot([("/data/tiny", FileSystemItem::file(THRESHOLD - 1))]);

        let changes = Snapshot::compare(&old, &new, THRESHOLD).expect("Compare failed");

        assert!(changes.is_empty());
    }

    #[test]
    fn deletions_are_not_reported_so_compare_is_asymmetric() {
        let with_extra = snapshot([
            ("/data/keep", FileSystemItem::file(100)),
            (
                "/data/extra",
                dir([("/data/extra/blob", 5 * THRESHOLD)]),
            ),
        ]);
        let without_extra = snapshot([("/data/keep", FileSystemItem::file(100))]);

        let forward =
            Snapshot::compare(&with_extra, &without_extra, THRESHOLD).expect("Compare failed");
        let backward =
            Snapshot::compare(&without_extra, &with_extra, THRESHOLD).expect("Compare failed");

        assert!(forward.is_empty());
        assert_eq!(backward, vec![change("/data/extra/blob", 5 * THRESHOLD)]);
    }

    #[test]
    fn non_positive_threshold_never_reports_zero_growth() {
        let old = snapshot([]);
        let new = snapshot([("/data/empty", FileSystemItem::default())]);

        let changes = Snapshot::compare(&old, &new, 0).expect("Compare failed");

        assert!(changes.is_empty());
    }

    #[test]
    fn different_roots_are_rejected() {
        let old = Snapshot::from_parts("/one", FileSystemItem::default());
        let new = Snapshot::from_parts("/two", FileSystemItem::default());

        let result = Snapshot::compare(&old, &new, THRESHOLD);

        match result {
            Err(CompareError::PathMismatch { old_root, new_root }) => {
                assert_eq!(old_root, PathBuf::from("/one"));
                assert_eq!(new_root, PathBuf::from("/two"));
            }
            other => panic!("Expected PathMismatch, got {other:?}"),
        }
    }

    #[test]
    fn extreme_sizes_saturate_growth() {
        let old = snapshot([("/data/file", FileSystemItem::file(i64::MIN))]);
        let new = snapshot([("/data/file", FileSystemItem::file(i64::MAX))]);

        let changes = Snapshot::compare(&old, &new, THRESHOLD).expect("Compare failed");

        assert_eq!(changes, vec![change("/data/file", i64::MAX)]);
    }

    #[test]
    fn relative_to_strips_root() {
        let inside = change("/data/dir/a", 1);
        let outside = change("/elsewhere/b", 1);

        assert_eq!(inside.relative_to(Path::new(ROOT)), Path::new("dir/a"));
        assert_eq!(
            outside.relative_to(Path::new(ROOT)),
            Path::new("/elsewhere/b")
        );
    }

    #[test]
    fn grown_file_on_disk_is_reported() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let big = temp.path().join("big.txt");
        fs::write(&big, vec![0u8; 100]).expect("Failed to write file");
        fs::write(temp.path().join("other.txt"), b"unchanged").expect("Failed to write file");

        let before = Snapshot::create(temp.path())
            .expect("Failed to create snapshot")
            .into_snapshot();
        fs::write(&big, vec![0u8; 100 + 2_000_000]).expect("Failed to grow file");
        let after = Snapshot::create(temp.path())
            .expect("Failed to create snapshot")
            .into_snapshot();

        let changes = Snapshot::compare(&before, &after, 1_000_000).expect("Compare failed");

        assert_eq!(
            changes,
            vec![Change {
                path: after.path().join("big.txt"),
                size_increase: 2_000_000,
            }]
        );
    }
}
