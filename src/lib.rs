//! # dirsync
//!
//! Deterministic directory synchronization: plan, preview, and mirror one
//! tree into another.
//!
//! dirsync compares a source and a target directory one level at a time,
//! by name and modification time, and applies the smallest set of copy,
//! create, and delete operations that brings the target in line with the
//! source. Content is never hashed.
//!
//! Policy:
//!
//! - **only copy if newer** (default): an existing target file is replaced
//!   only when the source copy is strictly newer.
//! - **mirror**: target entries with no counterpart in the source, or a
//!   counterpart of the other type, are deleted.
//! - **do not copy** / **do not delete**: glob patterns matched against full
//!   source / target paths.
//! - **preview**: print the trace without touching the filesystem.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! let report = dirsync::sync()
//!     .source("documents")
//!     .target("/mnt/backup/documents")
//!     .mirror(true)
//!     .do_not_copy(["**/*.tmp"])
//!     .run()?;
//!
//! println!("Finished with {} errors.", report.failures.len());
//! # Ok::<(), dirsync::SyncError>(())
//! ```
//!
//! # Planning without I/O
//!
//! [`plan()`] is the pure core and works on any listing:
//!
//! ```rust
//! use std::time::SystemTime;
//! use dirsync::{plan, Action, Entry, EntryKind, Rules};
//!
//! let dir = |name: &str| Entry {
//!     name:     name.into(),
//!     path:     name.into(),
//!     kind:     EntryKind::Dir,
//!     modified: SystemTime::UNIX_EPOCH,
//! };
//!
//! let plan = plan(&[dir("a"), dir("b")], &[dir("a")], &Rules::default());
//! assert_eq!(plan.instructions.len(), 1);
//! assert_eq!(plan.instructions[0].action, Action::NewDir);
//! assert_eq!(plan.directories, vec!["a", "b"]);
//! ```

#![forbid(unsafe_code)]

mod builder;
mod config;
mod engine;
mod entry;
mod error;
mod pattern;
mod plan;
mod results;
mod source;
mod trace;
mod traits;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::SyncBuilder;
pub use config::Config;
pub use entry::{Entry, EntryKind};
pub use error::SyncError;
pub use pattern::GlobPatterns;
pub use plan::{plan, Action, Instruction, Plan, Rules};
pub use results::{Failure, Report, SyncStats};
pub use source::FsSource;
pub use trace::{ConsoleReporter, SilentReporter};
pub use traits::{PathMatcher, Reporter, Source};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Create a new [`SyncBuilder`] to configure and run a sync.
///
/// # Example
///
/// ```rust
/// use dirsync::SilentReporter;
///
/// let src = tempfile::tempdir().unwrap();
/// let dst = tempfile::tempdir().unwrap();
/// std::fs::write(src.path().join("a.txt"), "a").unwrap();
///
/// let report = dirsync::sync()
///     .source(src.path())
///     .target(dst.path())
///     .reporter(SilentReporter)
///     .run()
///     .unwrap();
///
/// assert!(report.is_clean());
/// assert!(dst.path().join("a.txt").exists());
/// ```
pub fn sync() -> SyncBuilder {
    SyncBuilder::default()
}
