use std::path::{Path, PathBuf};

use ignore::{DirEntry, WalkBuilder};

use crate::entry::{Entry, EntryKind};
use crate::error::SyncError;
use crate::traits::Source;

// ---------------------------------------------------------------------------
// FsSource
// ---------------------------------------------------------------------------

/// The filesystem tree lister.
///
/// Lists exactly one level with every ignore-file and hidden-file filter
/// disabled: the planner sees everything and does its own exclusion.
/// Symlinks are reported as [`EntryKind::Symlink`] and never followed.
/// Children come back sorted by file name.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl Source for FsSource {
    fn list(&self, dir: &Path) -> Result<Vec<Entry>, SyncError> {
        let walker = WalkBuilder::new(dir)
            .standard_filters(false)
            .ignore(false)
            .parents(false)
            .hidden(false)
            .follow_links(false)
            .same_file_system(false)
            .max_depth(Some(1))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut entries = Vec::new();

        for res in walker {
            let entry = res.map_err(map_ignore_error)?;

            if entry.depth() == 0 {
                // The walker yields the root itself first; a root that is a
                // plain file walks fine but is not a listable directory.
                if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    return Err(SyncError::NotADirectory(dir.to_path_buf()));
                }
                continue;
            }

            entries.push(to_entry(&entry)?);
        }

        Ok(entries)
    }
}

fn to_entry(entry: &DirEntry) -> Result<Entry, SyncError> {
    let kind = match entry.file_type() {
        Some(ft) if ft.is_dir()     => EntryKind::Dir,
        Some(ft) if ft.is_file()    => EntryKind::File,
        Some(ft) if ft.is_symlink() => EntryKind::Symlink,
        _                           => EntryKind::Other,
    };

    let metadata = entry.metadata().map_err(map_ignore_error)?;
    let modified = metadata
        .modified()
        .map_err(|e| SyncError::from_io(entry.path(), e))?;

    Ok(Entry {
        name:     entry.file_name().to_os_string(),
        path:     entry.path().to_path_buf(),
        kind,
        modified,
    })
}

// ---------------------------------------------------------------------------
// Map ignore::Error to SyncError
// ---------------------------------------------------------------------------

fn map_ignore_error(e: ignore::Error) -> SyncError {
    match e {
        // `ignore` nests `WithPath` when a directory read fails.
        ignore::Error::WithPath { path, err } => attach_path(map_ignore_error(*err), path),
        ignore::Error::WithDepth { err, .. } => map_ignore_error(*err),
        ignore::Error::Io(io_err)            => SyncError::from_io(PathBuf::new(), io_err),
        other                                => SyncError::Source(other.to_string()),
    }
}

/// Give `err` the path `path` unless it already carries one. The innermost
/// path is the most specific, so it wins.
fn attach_path(err: SyncError, path: PathBuf) -> SyncError {
    let unset = |p: &PathBuf| p.as_os_str().is_empty();
    match err {
        SyncError::NotFound(p) if unset(&p)         => SyncError::NotFound(path),
        SyncError::PermissionDenied(p) if unset(&p) => SyncError::PermissionDenied(path),
        SyncError::Io { path: p, source } if unset(&p) => SyncError::Io { path, source },
        SyncError::Source(msg)                      => SyncError::Source(format!("{}: {msg}", path.display())),
        other                                       => other,
    }
}
