//! Core type definitions for replisync

mod action;
mod error;
mod snapshot;

pub use action::SyncAction;
pub use error::SyncError;
pub use snapshot::Snapshot;
