//! # replisync - Periodic one-way folder mirroring
//!
//! Every interval, the replica folder is made identical to the source folder:
//! new files are copied, replica-only files are deleted, and files that were
//! merely renamed in the source are moved inside the replica instead of being
//! copied again.

// Module declarations
pub mod config;
pub mod scanner;
pub mod diff;
pub mod executor;
pub mod hash;
pub mod reconcile;
pub mod scheduler;
pub mod logging;
pub mod commands;
pub mod types;

// Re-export commonly used types
pub use types::{Snapshot, SyncAction, SyncError};
pub use config::{Config, PhaseOrder};
pub use reconcile::{CycleReport, Reconciler};
pub use scheduler::Scheduler;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
