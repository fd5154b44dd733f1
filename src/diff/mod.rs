//! Diff engine - Classifies two snapshots into additions and removals

mod engine;

pub use engine::{compute_diff, TreeDiff};
