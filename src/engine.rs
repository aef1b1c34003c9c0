use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tracing::{debug, warn};

use crate::entry::Entry;
use crate::error::SyncError;
use crate::plan::{plan, Action, Instruction, Rules};
use crate::results::{Failure, Report, SyncStats};
use crate::traits::{Reporter, Source};

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

/// Internal options passed from the builder to `run()`.
pub(crate) struct EngineOptions {
    pub rules:    Rules,
    pub preview:  bool,
    pub lister:   Arc<dyn Source>,
    pub reporter: Arc<dyn Reporter>,
}

// ---------------------------------------------------------------------------
// run()
// ---------------------------------------------------------------------------

/// Bring `target_root` in line with `source_root`, level by level.
///
/// Each directory pair is listed, planned, and applied before any of its
/// subdirectories. Pairs are kept on an explicit stack, children pushed in
/// reverse, so subdirectories are visited depth-first in the order the
/// planner registered them.
///
/// Per-instruction failures are collected. A listing failure outside preview
/// mode aborts the whole run with `Err`, and the failures gathered so far are
/// dropped with it.
pub(crate) fn run(source_root: &Path, target_root: &Path, opts: &EngineOptions) -> Result<Report, SyncError> {
    let start = Instant::now();

    let mut stats    = SyncStats::default();
    let mut failures = Vec::new();
    let mut pending  = vec![(source_root.to_path_buf(), target_root.to_path_buf())];

    while let Some((source_dir, target_dir)) = pending.pop() {
        stats.directories += 1;
        debug!(source = %source_dir.display(), target = %target_dir.display(), "visiting");

        let (source_entries, target_entries) = match list_pair(opts.lister.as_ref(), &source_dir, &target_dir) {
            Ok(pair) => pair,
            // A preview reports the directories it would create; it does not
            // descend into their (not yet existing) contents.
            Err(e) if opts.preview => {
                warn!(error = %e, target = %target_dir.display(), "listing failed in preview; treating level as empty");
                (Vec::new(), Vec::new())
            }
            Err(e) => return Err(e),
        };

        let level = plan(&source_entries, &target_entries, &opts.rules);
        debug!(
            instructions = level.instructions.len(),
            directories  = level.directories.len(),
            "planned level"
        );
        stats.planned += level.instructions.len();

        for instruction in level.instructions {
            let target = target_dir.join(&instruction.subject);
            opts.reporter.instruction(&instruction, &target);

            if opts.preview {
                stats.applied += 1;
                continue;
            }

            match apply(&instruction, &source_dir, &target_dir) {
                Ok(()) => stats.applied += 1,
                Err(error) => {
                    warn!(%instruction, path = %target.display(), %error, "instruction failed");
                    failures.push(Failure {
                        instruction,
                        path: target,
                        error,
                    });
                }
            }
        }

        for name in level.directories.iter().rev() {
            pending.push((source_dir.join(name), target_dir.join(name)));
        }
    }

    stats.failed   = failures.len();
    stats.duration = start.elapsed();

    Ok(Report { failures, stats })
}

/// List both sides of a level concurrently. Either failure fails the pair.
fn list_pair(
    lister: &dyn Source,
    source_dir: &Path,
    target_dir: &Path,
) -> Result<(Vec<Entry>, Vec<Entry>), SyncError> {
    thread::scope(|s| {
        let source = s.spawn(|| lister.list(source_dir));
        let target = lister.list(target_dir);

        let source = source.join().unwrap_or_else(|_| {
            Err(SyncError::Source(format!("lister panicked on {}", source_dir.display())))
        });

        Ok((source?, target?))
    })
}

// ---------------------------------------------------------------------------
// Instruction application
// ---------------------------------------------------------------------------

fn apply(instruction: &Instruction, source_dir: &Path, target_dir: &Path) -> Result<(), SyncError> {
    let source = source_dir.join(&instruction.subject);
    let target = target_dir.join(&instruction.subject);

    let res = match instruction.action {
        Action::DeleteDir   => fs::remove_dir_all(&target),
        Action::DeleteFile  => fs::remove_file(&target),
        Action::ReplaceFile => fs::copy(&source, &target).map(drop),
        Action::NewDir      => fs::create_dir(&target),
        Action::NewFile     => copy_exclusive(&source, &target),
    };

    res.map_err(|e| SyncError::from_io(target, e))
}

/// Copy `source` to `target`, failing if `target` already exists.
fn copy_exclusive(source: &Path, target: &Path) -> io::Result<()> {
    let mut reader = fs::File::open(source)?;
    let permissions = reader.metadata()?.permissions();

    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)?;

    let written = io::copy(&mut reader, &mut writer).and_then(|_| writer.set_permissions(permissions));
    if let Err(e) = written {
        // Leave no partial file behind, or a retry would trip over `create_new`.
        drop(writer);
        let _ = fs::remove_file(target);
        return Err(e);
    }
    Ok(())
}
