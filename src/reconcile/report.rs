//! Cycle outcome and the events emitted while a cycle runs

use crate::types::{SyncAction, SyncError};
use indicatif::HumanBytes;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A per-entry failure that did not abort the cycle
#[derive(Debug)]
pub struct EntryWarning {
    /// Step that failed: "Copy", "Fingerprint", "Move" or "Delete"
    pub action: &'static str,
    /// Path relative to the tree roots
    pub path: PathBuf,
    pub error: SyncError,
}

/// Everything one reconciliation cycle did
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Actions applied (or reported, in dry-run mode), in application order
    pub actions: Vec<SyncAction>,
    pub warnings: Vec<EntryWarning>,
    pub bytes_copied: u64,
    /// The cycle stopped early because cancellation was requested
    pub cancelled: bool,
    pub dry_run: bool,
    pub duration: Duration,
}

impl CycleReport {
    pub fn copies(&self) -> usize {
        self.actions.iter().filter(|a| a.is_copy()).count()
    }

    pub fn moves(&self) -> usize {
        self.actions.iter().filter(|a| a.is_move()).count()
    }

    pub fn deletes(&self) -> usize {
        self.actions.iter().filter(|a| a.is_delete()).count()
    }

    /// No actions were needed and nothing failed
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty() && self.warnings.is_empty()
    }

    /// One-line summary used at the end of a cycle
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} copied ({}), {} moved, {} deleted, {} warning(s) in {:.2?}",
            self.copies(),
            HumanBytes(self.bytes_copied),
            self.moves(),
            self.deletes(),
            self.warnings.len(),
            self.duration
        );
        if self.dry_run {
            line.push_str(" [dry run, replica untouched]");
        }
        if self.cancelled {
            line.push_str(" [cancelled]");
        }
        line
    }
}

/// Events emitted by the reconciler while a cycle runs.
///
/// The reconciler never logs actions itself; whoever drives it decides
/// where these go.
#[derive(Debug)]
pub enum CycleEvent<'a> {
    CycleStarted {
        source: &'a Path,
        replica: &'a Path,
        dry_run: bool,
    },
    /// Both trees scanned and classified
    Planned {
        source_files: usize,
        replica_files: usize,
        to_add: usize,
        to_remove: usize,
    },
    ActionApplied {
        action: &'a SyncAction,
        /// Human-readable line with absolute paths
        message: String,
        bytes: u64,
    },
    EntryFailed {
        warning: &'a EntryWarning,
    },
    /// Cancellation observed; no further file operations in this cycle
    Cancelled,
    CycleFinished {
        source: &'a Path,
        replica: &'a Path,
        report: &'a CycleReport,
    },
}

/// Callback used to receive cycle events
pub type CycleCallback = dyn Fn(&CycleEvent<'_>) + Send + Sync;
