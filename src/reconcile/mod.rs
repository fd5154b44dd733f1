//! Reconciler - One synchronous mirroring cycle
//!
//! A cycle scans both trees, classifies the difference, then applies it:
//! missing files are copied, replica-only files are either recognised as
//! renames (same content as a newly added source file) and moved, or deleted.
//! Fatal scan errors abort before anything is written; per-file failures are
//! collected as warnings and the cycle carries on.

mod report;

pub use report::{CycleCallback, CycleEvent, CycleReport, EntryWarning};

use crate::config::{Config, PhaseOrder};
use crate::diff::compute_diff;
use crate::executor::{DryRunFs, FileOps, LocalFs};
use crate::hash::Digest;
use crate::scanner::scan_tree;
use crate::types::{SyncAction, SyncError};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Mirrors one source tree into one replica tree, one cycle at a time
pub struct Reconciler {
    source: PathBuf,
    replica: PathBuf,
    exclude_patterns: Vec<String>,
    phase_order: PhaseOrder,
    ops: Box<dyn FileOps>,
}

impl Reconciler {
    pub fn new(source: impl Into<PathBuf>, replica: impl Into<PathBuf>, ops: Box<dyn FileOps>) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
            exclude_patterns: Vec::new(),
            phase_order: PhaseOrder::default(),
            ops,
        }
    }

    /// Build a reconciler for a validated configuration.
    ///
    /// Dry-run configurations get `DryRunFs`, everything else `LocalFs`.
    pub fn from_config(config: &Config) -> Self {
        let ops: Box<dyn FileOps> = if config.dry_run {
            Box::new(DryRunFs)
        } else {
            Box::new(LocalFs)
        };
        Self::new(config.source.clone(), config.replica.clone(), ops)
            .with_excludes(config.exclude_patterns.clone())
            .with_phase_order(config.phase_order)
    }

    pub fn with_excludes(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_phase_order(mut self, order: PhaseOrder) -> Self {
        self.phase_order = order;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn replica(&self) -> &Path {
        &self.replica
    }

    /// Run one reconciliation cycle
    ///
    /// `cancel` is checked before scanning and before every file operation; a
    /// cancelled cycle returns `Ok` with `report.cancelled` set.
    ///
    /// # Errors
    /// * `SyncError::Scan` when either root cannot be walked. Nothing has been
    ///   written to the replica at that point.
    /// * `SyncError::Config` for an invalid exclude pattern
    pub fn run_cycle(
        &self,
        cancel: &CancellationToken,
        on_event: Option<&CycleCallback>,
    ) -> Result<CycleReport, SyncError> {
        let started = Instant::now();
        let mut cycle = Cycle::new(self, cancel, on_event);

        cycle.emit(CycleEvent::CycleStarted {
            source: &self.source,
            replica: &self.replica,
            dry_run: self.ops.is_dry_run(),
        });
        if cycle.cancelled() {
            return Ok(cycle.finish(started));
        }

        let source_snapshot = scan_tree(&self.source, &self.exclude_patterns)?;
        let replica_snapshot = scan_tree(&self.replica, &self.exclude_patterns)?;
        let diff = compute_diff(&source_snapshot, &replica_snapshot);

        cycle.emit(CycleEvent::Planned {
            source_files: source_snapshot.len(),
            replica_files: replica_snapshot.len(),
            to_add: diff.to_add.len(),
            to_remove: diff.to_remove.len(),
        });

        match self.phase_order {
            PhaseOrder::CopyFirst => {
                cycle.copy_phase(diff.to_add.iter());
                cycle.rename_or_remove_phase(&diff.to_remove, &diff.to_add, false);
            }
            PhaseOrder::RenamesFirst => {
                let claimed = cycle.rename_or_remove_phase(&diff.to_remove, &diff.to_add, true);
                cycle.copy_phase(diff.to_add.difference(&claimed));
            }
        }

        Ok(cycle.finish(started))
    }
}

/// Mutable state of a single running cycle
struct Cycle<'r> {
    reconciler: &'r Reconciler,
    cancel: &'r CancellationToken,
    on_event: Option<&'r CycleCallback>,
    report: CycleReport,
    /// Source digests computed so far; `None` marks an unreadable file
    source_digests: HashMap<PathBuf, Option<Digest>>,
}

impl<'r> Cycle<'r> {
    fn new(
        reconciler: &'r Reconciler,
        cancel: &'r CancellationToken,
        on_event: Option<&'r CycleCallback>,
    ) -> Self {
        Self {
            reconciler,
            cancel,
            on_event,
            report: CycleReport {
                dry_run: reconciler.ops.is_dry_run(),
                ..Default::default()
            },
            source_digests: HashMap::new(),
        }
    }

    fn emit(&self, event: CycleEvent<'_>) {
        if let Some(callback) = self.on_event {
            callback(&event);
        }
    }

    fn cancelled(&mut self) -> bool {
        if self.report.cancelled {
            return true;
        }
        if self.cancel.is_cancelled() {
            self.report.cancelled = true;
            self.emit(CycleEvent::Cancelled);
            return true;
        }
        false
    }

    fn applied(&mut self, action: SyncAction, bytes: u64) {
        let mut message = action.describe(&self.reconciler.source, &self.reconciler.replica);
        if self.report.dry_run {
            message.insert_str(0, "[dry run] ");
        }
        self.emit(CycleEvent::ActionApplied {
            action: &action,
            message,
            bytes,
        });
        self.report.bytes_copied += bytes;
        self.report.actions.push(action);
    }

    fn warn(&mut self, action: &'static str, path: &Path, error: SyncError) {
        let warning = EntryWarning {
            action,
            path: path.to_path_buf(),
            error,
        };
        self.emit(CycleEvent::EntryFailed { warning: &warning });
        self.report.warnings.push(warning);
    }

    /// Copy every given path from source to replica, isolating failures per entry
    fn copy_phase<'p>(&mut self, paths: impl Iterator<Item = &'p PathBuf>) {
        for path in paths {
            if self.cancelled() {
                return;
            }
            let src = self.reconciler.source.join(path);
            let dest = self.reconciler.replica.join(path);
            match self.reconciler.ops.copy(&src, &dest) {
                Ok(bytes) => self.applied(SyncAction::Copy(path.clone()), bytes),
                Err(e) => self.warn("Copy", path, e),
            }
        }
    }

    /// Move each removal candidate onto the first addition with identical
    /// content, or delete it when none matches.
    ///
    /// Candidates are tried in the sorted order of `to_add`. With `claim`, an
    /// addition can absorb only one rename; the claimed set is returned.
    fn rename_or_remove_phase(
        &mut self,
        to_remove: &BTreeSet<PathBuf>,
        to_add: &BTreeSet<PathBuf>,
        claim: bool,
    ) -> BTreeSet<PathBuf> {
        let mut claimed = BTreeSet::new();

        for stale in to_remove {
            if self.cancelled() {
                break;
            }

            let stale_abs = self.reconciler.replica.join(stale);
            let stale_digest = match self.reconciler.ops.fingerprint(&stale_abs) {
                Ok(digest) => digest,
                Err(e) => {
                    // Unknown content: leave the file for the next cycle rather than delete it.
                    self.warn("Fingerprint", stale, e);
                    continue;
                }
            };

            let mut target = None;
            for candidate in to_add {
                if claim && claimed.contains(candidate) {
                    continue;
                }
                if self.source_digest(candidate) == Some(stale_digest) {
                    target = Some(candidate);
                    break;
                }
            }

            match target {
                Some(target) => {
                    tracing::debug!(
                        "Content of {} matches {} ({})",
                        stale.display(),
                        target.display(),
                        stale_digest
                    );
                    let dest = self.reconciler.replica.join(target);
                    match self.reconciler.ops.rename(&stale_abs, &dest) {
                        Ok(()) => {
                            self.prune_parents(&stale_abs);
                            if claim {
                                claimed.insert(target.clone());
                            }
                            self.applied(
                                SyncAction::Move {
                                    from: stale.clone(),
                                    to: target.clone(),
                                },
                                0,
                            );
                        }
                        Err(e) => self.warn("Move", stale, e),
                    }
                }
                None => match self.reconciler.ops.remove(&stale_abs) {
                    Ok(()) => {
                        self.prune_parents(&stale_abs);
                        self.applied(SyncAction::Delete(stale.clone()), 0);
                    }
                    Err(e) => self.warn("Delete", stale, e),
                },
            }
        }

        claimed
    }

    /// Drop directories a move or delete left empty, so a source file may take their name
    fn prune_parents(&self, removed: &Path) {
        if let Some(parent) = removed.parent() {
            self.reconciler
                .ops
                .prune_empty_dirs(parent, &self.reconciler.replica);
        }
    }

    /// Digest of a source file, computed once per cycle
    fn source_digest(&mut self, relative: &Path) -> Option<Digest> {
        if let Some(cached) = self.source_digests.get(relative) {
            return *cached;
        }
        let digest = match self.reconciler.ops.fingerprint(&self.reconciler.source.join(relative)) {
            Ok(digest) => Some(digest),
            Err(e) => {
                self.warn("Fingerprint", relative, e);
                None
            }
        };
        self.source_digests.insert(relative.to_path_buf(), digest);
        digest
    }

    fn finish(mut self, started: Instant) -> CycleReport {
        self.report.duration = started.elapsed();
        self.emit(CycleEvent::CycleFinished {
            source: &self.reconciler.source,
            replica: &self.reconciler.replica,
            report: &self.report,
        });
        self.report
    }
}
