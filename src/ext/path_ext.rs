use std::path::{Component, Path, PathBuf};

/// Renders paths for messages, resolving them as far as the filesystem allows.
pub trait BestEffortPathExt {
    /// The canonical form of the path if it exists, otherwise the lexically normalized
    /// absolute form.
    fn best_effort_path_display(&self) -> String;
}

impl BestEffortPathExt for Path {
    fn best_effort_path_display(&self) -> String {
        if let Ok(canonical) = self.canonicalize() {
            return canonical.display().to_string();
        }

        let absolute = std::path::absolute(self).unwrap_or_else(|_| self.to_path_buf());
        normalize(&absolute).display().to_string()
    }
}

/// Drops `.` components and resolves `..` against the preceding component.
fn normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            other => components.push(other),
        }
    }

    components.iter().collect()
}
