use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::engine::{run, EngineOptions};
use crate::error::SyncError;
use crate::results::Report;
use crate::source::FsSource;
use crate::trace::ConsoleReporter;
use crate::traits::{Reporter, Source};

// ---------------------------------------------------------------------------
// SyncBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring and executing a sync.
///
/// Created via [`dirsync::sync()`](crate::sync). Configure with chained
/// builder methods, then call [`run()`](SyncBuilder::run) to execute.
///
/// # Example
///
/// ```rust,ignore
/// let report = dirsync::sync()
///     .source("photos")
///     .target("/mnt/backup/photos")
///     .mirror(true)
///     .do_not_delete(["**/.keep"])
///     .preview(true)
///     .run()?;
/// ```
pub struct SyncBuilder {
    config:   Config,
    lister:   Option<Arc<dyn Source>>,
    reporter: Option<Arc<dyn Reporter>>,
}

impl Default for SyncBuilder {
    fn default() -> Self {
        Self::from_config(Config::default())
    }
}

impl SyncBuilder {
    /// Start from a fully populated [`Config`].
    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            lister:   None,
            reporter: None,
        }
    }

    // ── Roots ─────────────────────────────────────────────────────────────

    /// The directory to copy from.
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.source = Some(path.into());
        self
    }

    /// The directory to bring in line with the source.
    pub fn target(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.target = Some(path.into());
        self
    }

    // ── Policy ────────────────────────────────────────────────────────────

    /// Replace target files only when the source copy is strictly newer.
    ///
    /// On by default. Turn off to overwrite every file present on both sides.
    pub fn only_copy_if_newer(mut self, yes: bool) -> Self {
        self.config.only_copy_if_newer = yes;
        self
    }

    /// Mirror mode: delete target entries that have no same-typed
    /// counterpart in the source. Off by default.
    pub fn mirror(mut self, yes: bool) -> Self {
        self.config.delete = yes;
        self
    }

    /// Glob patterns for source paths that are never copied or descended into.
    pub fn do_not_copy<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.do_not_copy.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Glob patterns for target paths that are never deleted or overwritten.
    pub fn do_not_delete<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.do_not_delete.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Report every planned instruction without touching the filesystem.
    pub fn preview(mut self, yes: bool) -> Self {
        self.config.preview = yes;
        self
    }

    // ── Collaborators ─────────────────────────────────────────────────────

    /// Replace the filesystem tree lister.
    pub fn lister(mut self, lister: impl Source + 'static) -> Self {
        self.lister = Some(Arc::new(lister));
        self
    }

    /// Replace the console trace. Defaults to a coloured [`ConsoleReporter`].
    pub fn reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    /// The configuration assembled so far.
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Execute the sync and return a report.
    ///
    /// Blocks until the whole tree has been processed. Relative roots are
    /// made absolute against the current directory first, so `do_not_copy`
    /// and `do_not_delete` patterns always see absolute paths.
    ///
    /// # Errors
    ///
    /// Returns `Err` before touching anything if a root is missing or not a
    /// directory, or if a pattern does not compile. During the run, only a
    /// directory that cannot be listed is fatal (and not in preview mode);
    /// per-instruction failures are collected into [`Report::failures`].
    pub fn run(self) -> Result<Report, SyncError> {
        let source = self
            .config
            .source
            .clone()
            .ok_or_else(|| SyncError::InvalidConfig("no source provided".into()))?;
        let target = self
            .config
            .target
            .clone()
            .ok_or_else(|| SyncError::InvalidConfig("no target provided".into()))?;

        // Patterns match against full paths, so relative roots are resolved
        // against the working directory first.
        let source = absolute(&source)?;
        let target = absolute(&target)?;

        require_dir(&source)?;
        require_dir(&target)?;

        let rules = self.config.rules()?;
        let preview = self.config.preview;

        let opts = EngineOptions {
            rules,
            preview,
            lister:   self.lister.unwrap_or_else(|| Arc::new(FsSource)),
            reporter: self.reporter.unwrap_or_else(|| Arc::new(ConsoleReporter::new())),
        };

        info!(
            source = %source.display(),
            target = %target.display(),
            mirror = self.config.delete,
            "starting sync{}",
            if preview { " preview" } else { "" }
        );

        let report = run(&source, &target, &opts)?;

        info!(
            errors   = report.failures.len(),
            applied  = report.stats.applied,
            duration = ?report.stats.duration,
            "finished with {} errors",
            report.failures.len()
        );

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn absolute(path: &Path) -> Result<PathBuf, SyncError> {
    std::path::absolute(path).map_err(|e| SyncError::from_io(path, e))
}

/// Roots must exist and be real directories, not links to them.
fn require_dir(path: &Path) -> Result<(), SyncError> {
    let meta = fs::symlink_metadata(path).map_err(|e| SyncError::from_io(path, e))?;
    if !meta.is_dir() {
        return Err(SyncError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}
