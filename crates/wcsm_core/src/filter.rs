use std::path::{Component, Path, PathBuf};

/// Tells the snapshot writer's own output apart from external edits.
///
/// Snapshots are written inside the watched tree, so without this every write
/// would trigger another grab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    base_dir: PathBuf,
    output_root: PathBuf,
    canonical_root: Option<PathBuf>,
}

impl ChangeFilter {
    /// `base_dir` resolves relative paths, both for `output_root` here and for
    /// event paths later. It is normally the process working directory.
    pub fn new(output_root: &Path, base_dir: &Path) -> Self {
        let base_dir = normalize_lexically(base_dir);
        let output_root = absolutize(output_root, &base_dir);
        let canonical_root = std::fs::canonicalize(&output_root)
            .ok()
            .filter(|canonical| *canonical != output_root);
        Self {
            base_dir,
            output_root,
            canonical_root,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// `false` when `event_path` is the output root or anywhere below it.
    pub fn should_trigger(&self, event_path: &Path) -> bool {
        let event_path = absolutize(event_path, &self.base_dir);
        !event_path
            .ancestors()
            .any(|ancestor| self.is_output_root(ancestor))
    }

    fn is_output_root(&self, candidate: &Path) -> bool {
        // Path equality compares component-wise: `/out` never equals `/output2`.
        candidate == self.output_root || self.canonical_root.as_deref() == Some(candidate)
    }
}

fn absolutize(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&base_dir.join(path))
    }
}

/// Drop `.` components and fold `..` into the parent without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                );
                if at_root {
                    if !out.has_root() {
                        out.push("..");
                    }
                } else if out.ends_with("..") {
                    out.push("..");
                } else {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
