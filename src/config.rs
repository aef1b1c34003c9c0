use std::path::PathBuf;
use std::sync::Arc;

use crate::error::SyncError;
use crate::pattern::GlobPatterns;
use crate::plan::Rules;

/// Everything a sync run needs, as plain values.
///
/// Usually assembled through [`SyncBuilder`](crate::SyncBuilder); construct
/// it directly when the settings come from elsewhere (a config file, a CLI)
/// and hand it over with [`SyncBuilder::from_config`](crate::SyncBuilder::from_config).
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory to copy from.
    pub source: Option<PathBuf>,

    /// Directory to bring in line with `source`.
    pub target: Option<PathBuf>,

    /// Replace files only when the source copy is strictly newer. Default `true`.
    pub only_copy_if_newer: bool,

    /// Mirror mode: delete target entries missing from the source. Default `false`.
    pub delete: bool,

    /// Glob patterns for source paths that must never be copied.
    pub do_not_copy: Vec<String>,

    /// Glob patterns for target paths that must never be deleted or overwritten.
    pub do_not_delete: Vec<String>,

    /// Report what would happen without touching the filesystem. Default `false`.
    pub preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source:             None,
            target:             None,
            only_copy_if_newer: true,
            delete:             false,
            do_not_copy:        Vec::new(),
            do_not_delete:      Vec::new(),
            preview:            false,
        }
    }
}

impl Config {
    /// Compile the policy fields into planner [`Rules`].
    ///
    /// # Errors
    ///
    /// [`SyncError::InvalidPattern`] for the first pattern that is not a valid glob.
    pub fn rules(&self) -> Result<Rules, SyncError> {
        Ok(Rules {
            only_copy_if_newer: self.only_copy_if_newer,
            mirror:             self.delete,
            do_not_copy:        Arc::new(GlobPatterns::new(self.do_not_copy.iter().cloned())?),
            do_not_delete:      Arc::new(GlobPatterns::new(self.do_not_delete.iter().cloned())?),
        })
    }
}
