use std::path::Path;

use crate::entry::Entry;
use crate::error::SyncError;
use crate::plan::Instruction;

/// Lists the immediate children of a directory.
///
/// This is the tree lister the executor calls once per side per level.
/// [`FsSource`](crate::FsSource) is the filesystem implementation; custom
/// listers are useful for tests or for wrapping a filesystem with extra
/// bookkeeping.
///
/// # Contract
///
/// - One level only. No recursion.
/// - No filtering. Exclusion is entirely the planner's business.
/// - `Err` when `dir` is missing, not a directory, or unreadable. The
///   executor decides whether that is fatal (it is not in preview mode).
///
/// # Thread Safety
///
/// `Send + Sync` are required: the source and target listings of a level
/// are fetched concurrently.
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use dirsync::{Entry, Source, SyncError};
///
/// struct Empty;
///
/// impl Source for Empty {
///     fn list(&self, _dir: &Path) -> Result<Vec<Entry>, SyncError> {
///         Ok(Vec::new())
///     }
/// }
/// ```
pub trait Source: Send + Sync {
    /// Enumerate the immediate children of `dir`.
    fn list(&self, dir: &Path) -> Result<Vec<Entry>, SyncError>;
}

/// Decides whether a path is covered by an exclusion set.
///
/// Used for both `do_not_copy` (checked against source paths) and
/// `do_not_delete` (checked against target paths). The default
/// implementation is [`GlobPatterns`](crate::GlobPatterns); implement this
/// to swap in different matching semantics without touching the planner.
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use dirsync::PathMatcher;
///
/// struct Hidden;
///
/// impl PathMatcher for Hidden {
///     fn is_match(&self, path: &Path) -> bool {
///         path.file_name()
///             .map(|n| n.to_string_lossy().starts_with('.'))
///             .unwrap_or(false)
///     }
/// }
/// ```
pub trait PathMatcher: Send + Sync {
    /// Returns `true` if `path` matches any pattern in the set.
    fn is_match(&self, path: &Path) -> bool;
}

/// Receives the trace of every instruction as it is applied.
///
/// Called once per instruction, in emission order, whether or not the run
/// is a preview, and before the filesystem is touched. A preview therefore
/// produces exactly the trace the real run would.
pub trait Reporter: Send + Sync {
    /// `target` is the full target-side path the instruction addresses.
    fn instruction(&self, instruction: &Instruction, target: &Path);
}
