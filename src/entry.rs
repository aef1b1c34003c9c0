use std::ffi::OsString;
use std::path::PathBuf;
use std::time::SystemTime;

/// One child observed at a single directory level by a
/// [`Source`](crate::traits::Source).
///
/// Entries are fresh on every listing and never mutated. `path` is only
/// used for pattern matching; identity across the two sides is by `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Name within the listed directory. Unique per listing, kept as the
    /// platform reports it so non-UTF-8 names round-trip.
    pub name: OsString,

    /// Full path as seen by the lister.
    pub path: PathBuf,

    /// What kind of entry this is.
    pub kind: EntryKind,

    /// Last modification time. Only meaningful for files.
    pub modified: SystemTime,
}

impl Entry {
    /// Whether the planner treats this entry as a directory.
    ///
    /// Symlinks are not followed, so a link to a directory counts as a file.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// The kind of a listed entry, as reported by `lstat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,

    /// A directory.
    Dir,

    /// A symbolic link.
    Symlink,

    /// Anything else (device files, pipes, sockets, etc.).
    Other,
}
