//! Sequential directory walker

use crate::types::{Snapshot, SyncError};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

/// Scan a directory and build a Snapshot of every regular file below it
///
/// Uses the `ignore` crate for traversal with all of its standard filters
/// disabled: hidden files and `.gitignore` rules are mirrored like anything
/// else. Only the explicit exclude globs filter entries.
///
/// # Arguments
/// * `root_path` - The root directory to scan
/// * `exclude_patterns` - Glob patterns (gitignore syntax) to leave out
///
/// # Errors
/// * `SyncError::Scan` if the root is missing, not a directory, or any
///   traversal error occurs below it. Partial results are discarded.
/// * `SyncError::Config` if an exclude pattern is invalid
///
/// Symlinks are never descended into. A symlink resolving to a regular file is
/// recorded like a file; broken symlinks and special files are skipped with a
/// warning.
pub fn scan_tree(root_path: &Path, exclude_patterns: &[String]) -> Result<Snapshot, SyncError> {
    let start_time = Instant::now();

    let root_metadata = fs::metadata(root_path).map_err(|e| SyncError::Scan {
        root: root_path.to_path_buf(),
        source: e,
    })?;
    if !root_metadata.is_dir() {
        return Err(SyncError::Scan {
            root: root_path.to_path_buf(),
            source: io::Error::other("root is not a directory"),
        });
    }

    let mut snapshot = Snapshot::new(root_path.to_path_buf());

    let mut override_builder = ignore::overrides::OverrideBuilder::new(root_path);
    for pattern in exclude_patterns {
        // The ignore crate's OverrideBuilder uses ! for exclusion
        let exclude_pattern = format!("!{}", pattern);
        override_builder.add(&exclude_pattern).map_err(|e| {
            SyncError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
        })?;
    }
    let overrides = override_builder
        .build()
        .map_err(|e| SyncError::Config(format!("Failed to build exclude overrides: {}", e)))?;

    let walker = ignore::WalkBuilder::new(root_path)
        .standard_filters(false)
        .follow_links(false)
        .overrides(overrides)
        .build();

    for result in walker {
        let entry = result.map_err(|e| SyncError::Scan {
            root: root_path.to_path_buf(),
            source: walk_error_to_io(e),
        })?;

        if entry.depth() == 0 {
            continue;
        }

        let file_type = match entry.file_type() {
            Some(ft) => ft,
            None => continue,
        };

        if file_type.is_dir() {
            snapshot.increment_dirs();
            continue;
        }

        if file_type.is_symlink() {
            match fs::metadata(entry.path()) {
                Ok(target) if target.is_file() => {}
                Ok(_) => {
                    tracing::debug!(
                        "Skipping symlink to non-file {}",
                        entry.path().display()
                    );
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping broken symlink {}: {}",
                        entry.path().display(),
                        e
                    );
                    continue;
                }
            }
        } else if !file_type.is_file() {
            tracing::warn!(
                "Skipping special file {} (not a regular file)",
                entry.path().display()
            );
            continue;
        }

        let relative_path = match entry.path().strip_prefix(root_path) {
            Ok(p) => p.to_path_buf(),
            Err(_) => {
                tracing::warn!(
                    "Failed to calculate relative path for {}. File will be skipped.",
                    entry.path().display()
                );
                continue;
            }
        };

        snapshot.insert(relative_path);
    }

    snapshot.set_scan_duration(start_time.elapsed());
    tracing::debug!(
        "Scanned {}: {} file(s), {} dir(s) in {:?}",
        root_path.display(),
        snapshot.len(),
        snapshot.total_dirs,
        snapshot.scan_duration
    );

    Ok(snapshot)
}

fn walk_error_to_io(error: ignore::Error) -> io::Error {
    let kind = error
        .io_error()
        .map(|e| e.kind())
        .unwrap_or(io::ErrorKind::Other);
    io::Error::new(kind, error.to_string())
}
