//! Record of files touched during a run

use std::collections::BTreeSet;

/// Workspace-relative paths that tools successfully wrote or edited.
///
/// Repeated writes to the same path are recorded once.
#[derive(Debug, Default, Clone)]
pub struct ChangeTracker {
    files: BTreeSet<String>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path as changed.
    pub fn track(&mut self, path: impl Into<String>) {
        self.files.insert(path.into());
    }

    /// Changed paths, each listed once.
    pub fn files(&self) -> Vec<String> {
        self.files.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
