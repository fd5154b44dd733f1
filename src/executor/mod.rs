//! Executor module - The filesystem mutation capability handed to the reconciler

pub mod copy;

use crate::hash::{fingerprint, Digest};
use crate::types::SyncError;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub use copy::copy_file_atomic;

/// Perform copy / move / delete against the filesystem.
///
/// All paths are absolute. Implementations must not retry; the next cycle
/// re-plans anything that failed.
pub trait FileOps: Send + Sync {
    /// Copy `src` to `dest`, creating parent directories. Returns bytes copied.
    fn copy(&self, src: &Path, dest: &Path) -> Result<u64, SyncError>;

    /// Move `from` to `to`, creating parent directories and replacing any file at `to`.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), SyncError>;

    /// Delete a single file. A file that is already gone counts as deleted.
    fn remove(&self, path: &Path) -> Result<(), SyncError>;

    /// Remove `dir` and its ancestors while they are empty, stopping below `root`.
    /// Returns how many directories were removed.
    fn prune_empty_dirs(&self, _dir: &Path, _root: &Path) -> usize {
        0
    }

    /// Content digest used to match removals against additions
    fn fingerprint(&self, path: &Path) -> Result<Digest, SyncError> {
        fingerprint(path)
    }

    /// True when operations are only reported, never applied
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Applies operations to the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileOps for LocalFs {
    fn copy(&self, src: &Path, dest: &Path) -> Result<u64, SyncError> {
        copy_file_atomic(src, dest)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), SyncError> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| SyncError::write(parent, e))?;
        }
        fs::rename(from, to).map_err(|e| SyncError::write(from, e))
    }

    fn remove(&self, path: &Path) -> Result<(), SyncError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::write(path, e)),
        }
    }

    fn prune_empty_dirs(&self, dir: &Path, root: &Path) -> usize {
        let mut removed = 0;
        let mut current = Some(dir);
        while let Some(candidate) = current {
            if candidate == root || !candidate.starts_with(root) {
                break;
            }
            // Fails on non-empty directories, which ends the walk
            if fs::remove_dir(candidate).is_err() {
                break;
            }
            tracing::debug!("Removed empty directory {}", candidate.display());
            removed += 1;
            current = candidate.parent();
        }
        removed
    }
}

/// Reports operations without touching the replica.
///
/// Copies still stat the source so a vanished file surfaces the same
/// `Read` error a real run would.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunFs;

impl FileOps for DryRunFs {
    fn copy(&self, src: &Path, _dest: &Path) -> Result<u64, SyncError> {
        fs::metadata(src)
            .map(|m| m.len())
            .map_err(|e| SyncError::read(src, e))
    }

    fn rename(&self, _from: &Path, _to: &Path) -> Result<(), SyncError> {
        Ok(())
    }

    fn remove(&self, _path: &Path) -> Result<(), SyncError> {
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
