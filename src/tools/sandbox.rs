//! Workspace containment for agent-initiated filesystem access.
//!
//! Resolution is purely lexical: the requested path is joined onto the root,
//! `.` and `..` are folded away, and the result must still sit under the root.
//! Nothing touches the disk until a path has passed this check.

use std::path::{Component, Path, PathBuf};

use crate::error::Error;
use crate::Result;

/// A fixed workspace root that every tool path must resolve inside.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Create a sandbox rooted at `root`.
    ///
    /// Relative roots are anchored at the current directory so that later
    /// containment checks compare absolute paths.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let absolute = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };
        Ok(Self {
            root: normalize(&absolute),
        })
    }

    /// The normalized workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a tool-supplied path to an absolute path inside the workspace.
    ///
    /// Absolute paths are accepted only when they already point inside the
    /// root. Anything that escapes is rejected with [`Error::OutsideWorkspace`].
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let requested = Path::new(path);
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        };
        let resolved = normalize(&joined);

        if !resolved.starts_with(&self.root) {
            return Err(Error::OutsideWorkspace(path.to_string()));
        }
        Ok(resolved)
    }

    /// Express a resolved path relative to the root, using `/` separators.
    ///
    /// The root itself is rendered as `.`.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.is_empty() {
            ".".to_string()
        } else {
            parts.join("/")
        }
    }
}

/// Lexically fold `.` and `..` components. `..` at the filesystem root stays
/// at the root, matching how the OS would resolve it.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
