//! Snapshot - The set of file identities under one root at one instant

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Files present under a tree root, keyed by path relative to that root.
///
/// Backed by a `BTreeSet`, so iteration is in component-wise lexicographic
/// order of the relative paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Relative paths of every regular file under the root
    pub paths: BTreeSet<PathBuf>,

    /// Number of directories traversed (root excluded)
    pub total_dirs: usize,

    /// Scan metadata
    pub scan_duration: Duration,
    pub root_path: PathBuf,
}

impl Snapshot {
    /// Create a new empty Snapshot
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            paths: BTreeSet::new(),
            total_dirs: 0,
            scan_duration: Duration::from_secs(0),
            root_path,
        }
    }

    /// Record a relative file path. Returns false if it was already present.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.paths.insert(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterator over the relative paths, in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    pub fn set_scan_duration(&mut self, duration: Duration) {
        self.scan_duration = duration;
    }

    pub fn increment_dirs(&mut self) {
        self.total_dirs += 1;
    }
}
