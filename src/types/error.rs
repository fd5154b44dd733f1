//! Error types for replisync

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for replisync operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// A tree root could not be walked. Fatal to the cycle, raised before any mutation.
    #[error("Scan failed for {root}: {source}")]
    Scan {
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file vanished or could not be read (fingerprint or copy source)
    #[error("Read failed for {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A replica-side mutation (copy, move, delete) failed
    #[error("Write failed for {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SyncError {
    /// Check if this error aborts a whole reconciliation cycle
    pub fn is_fatal_to_cycle(&self) -> bool {
        matches!(self, SyncError::Scan { .. } | SyncError::Config(_))
    }

    /// Check if this error is isolated to a single file entry
    pub fn is_entry_error(&self) -> bool {
        matches!(self, SyncError::Read { .. } | SyncError::Write { .. })
    }

    /// Underlying IO error kind, if any
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            SyncError::Scan { source, .. }
            | SyncError::Read { source, .. }
            | SyncError::Write { source, .. } => Some(source.kind()),
            SyncError::Io(e) => Some(e.kind()),
            SyncError::Config(_) => None,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SyncError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SyncError::Write {
            path: path.into(),
            source,
        }
    }
}
