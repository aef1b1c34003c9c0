use std::path::PathBuf;
use std::time::Duration;

use crate::error::SyncError;
use crate::plan::Instruction;

/// The output of a completed sync (or preview).
#[derive(Debug)]
pub struct Report {
    /// Instructions that could not be applied, in the order they were tried.
    /// A failure never stops the run; the remaining instructions still run.
    pub failures: Vec<Failure>,

    /// Run statistics.
    pub stats: SyncStats,
}

impl Report {
    /// `true` when every planned instruction was applied.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One instruction that failed to apply.
#[derive(Debug)]
pub struct Failure {
    /// The instruction as planned.
    pub instruction: Instruction,

    /// The target-side path it addressed.
    pub path: PathBuf,

    /// Why it failed.
    pub error: SyncError,
}

/// Statistics for a completed run.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Directory pairs visited, the roots included.
    pub directories: usize,

    /// Instructions planned across all levels.
    pub planned: usize,

    /// Instructions applied (or, in preview mode, reported) without error.
    pub applied: usize,

    /// Instructions that failed. Equals `failures.len()`.
    pub failed: usize,

    /// Wall-clock time from start to completion.
    pub duration: Duration,
}
