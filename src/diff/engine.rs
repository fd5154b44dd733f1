//! Set difference between two snapshots

use crate::types::Snapshot;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Classification of two snapshots into additions and removals.
///
/// Both sets iterate in sorted order, which fixes the tie-break order used by
/// rename detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDiff {
    /// Present in the source, missing from the replica
    pub to_add: BTreeSet<PathBuf>,

    /// Present in the replica, missing from the source
    pub to_remove: BTreeSet<PathBuf>,
}

impl TreeDiff {
    /// True when the two trees hold the same set of paths
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute `source − replica` and `replica − source`
///
/// Paths present on both sides are left out entirely; their content is never
/// compared, so a file edited in place under the same path is not re-copied.
///
/// # Example
/// ```
/// use replisync::diff::compute_diff;
/// use replisync::types::Snapshot;
/// use std::path::PathBuf;
///
/// let mut source = Snapshot::new(PathBuf::from("src"));
/// let mut replica = Snapshot::new(PathBuf::from("dst"));
/// source.insert(PathBuf::from("new.txt"));
/// source.insert(PathBuf::from("kept.txt"));
/// replica.insert(PathBuf::from("kept.txt"));
/// replica.insert(PathBuf::from("old.txt"));
///
/// let diff = compute_diff(&source, &replica);
/// assert!(diff.to_add.contains(&PathBuf::from("new.txt")));
/// assert!(diff.to_remove.contains(&PathBuf::from("old.txt")));
/// assert_eq!(diff.to_add.len() + diff.to_remove.len(), 2);
/// ```
pub fn compute_diff(source: &Snapshot, replica: &Snapshot) -> TreeDiff {
    TreeDiff {
        to_add: source.paths.difference(&replica.paths).cloned().collect(),
        to_remove: replica.paths.difference(&source.paths).cloned().collect(),
    }
}
