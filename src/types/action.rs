//! SyncAction - Mutations applied by the reconciler

use std::path::{Path, PathBuf};

/// One filesystem mutation against the replica.
///
/// Paths are relative to the tree roots; a `Copy` reads `source/path` and
/// writes `replica/path`, `Move` and `Delete` only touch the replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Copy a file missing from the replica
    Copy(PathBuf),

    /// Rename detection: replica file `from` carries the content of source `to`
    Move { from: PathBuf, to: PathBuf },

    /// Delete a replica file with no counterpart in the source
    Delete(PathBuf),
}

impl SyncAction {
    /// Short label used in logs and summaries
    pub fn action_name(&self) -> &'static str {
        match self {
            SyncAction::Copy(_) => "Copy",
            SyncAction::Move { .. } => "Move",
            SyncAction::Delete(_) => "Delete",
        }
    }

    pub fn is_copy(&self) -> bool {
        matches!(self, SyncAction::Copy(_))
    }

    pub fn is_move(&self) -> bool {
        matches!(self, SyncAction::Move { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, SyncAction::Delete(_))
    }

    /// Log line for this action with both roots resolved
    pub fn describe(&self, source_root: &Path, replica_root: &Path) -> String {
        match self {
            SyncAction::Copy(path) => format!(
                "Copied {} to {}",
                source_root.join(path).display(),
                replica_root.join(path).display()
            ),
            SyncAction::Move { from, to } => format!(
                "Moved {} to {}",
                replica_root.join(from).display(),
                replica_root.join(to).display()
            ),
            SyncAction::Delete(path) => {
                format!("Deleted {}", replica_root.join(path).display())
            }
        }
    }
}
