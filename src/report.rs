//! Presentation of comparison results for terminal output.

use std::path::Path;

use colored::Colorize;
use humansize::{BINARY, format_size};

use crate::snapshot::Change;

/// Turns colored output off when stdout cannot render it.
pub fn configure_colors() {
    if supports_color::on(supports_color::Stream::Stdout).is_none() {
        colored::control::set_override(false);
    }
}

/// Orders changes by descending growth, then by path.
pub fn rank(changes: &mut [Change]) {
    changes.sort_by(|a, b| {
        b.size_increase
            .cmp(&a.size_increase)
            .then_with(|| a.path.cmp(&b.path))
    });
}

pub fn human_size(bytes: i64) -> String {
    let magnitude = format_size(bytes.unsigned_abs(), BINARY);
    if bytes < 0 {
        format!("-{magnitude}")
    } else {
        magnitude
    }
}

/// Renders one line per change, largest growth first.
///
/// With `relative` set, paths are shown relative to `root`.
pub fn render(root: &Path, changes: &[Change], threshold: i64, relative: bool) -> String {
    if changes.is_empty() {
        return format!(
            "Nothing under {} grew by {} or more",
            root.display(),
            human_size(threshold)
        );
    }

    let mut ranked = changes.to_vec();
    rank(&mut ranked);

    ranked
        .iter()
        .map(|change| {
            let path = if relative {
                change.relative_to(root)
            } else {
                change.path.as_path()
            };
            let size = format!("+{:>11}", human_size(change.size_increase));
            format!("{}  {}", size.yellow().bold(), path.display())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
