use std::collections::{HashMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::sync::Arc;

use crate::entry::Entry;
use crate::pattern::GlobPatterns;
use crate::traits::PathMatcher;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// The policy the planner applies at every level.
///
/// Built from a [`Config`](crate::Config) via
/// [`Config::rules()`](crate::Config::rules), or directly when driving
/// [`plan()`] by hand.
#[derive(Clone)]
pub struct Rules {
    /// Replace a file only when the source copy is strictly newer.
    pub only_copy_if_newer: bool,

    /// Mirror mode: delete target entries that have no same-typed source.
    pub mirror: bool,

    /// Matched against source paths. Excluded entries are never created,
    /// replaced, or descended into.
    pub do_not_copy: Arc<dyn PathMatcher>,

    /// Matched against target paths. Protected entries are never deleted
    /// or overwritten.
    pub do_not_delete: Arc<dyn PathMatcher>,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            only_copy_if_newer: true,
            mirror:             false,
            do_not_copy:        Arc::new(GlobPatterns::empty()),
            do_not_delete:      Arc::new(GlobPatterns::empty()),
        }
    }
}

impl fmt::Debug for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rules")
            .field("only_copy_if_newer", &self.only_copy_if_newer)
            .field("mirror", &self.mirror)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// What an [`Instruction`] does to its subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Remove a target file (or link).
    DeleteFile,
    /// Remove a target directory and everything below it.
    DeleteDir,
    /// Copy a source file over an existing target file.
    ReplaceFile,
    /// Copy a source file to a target path that must not exist yet.
    NewFile,
    /// Create a single target directory.
    NewDir,
}

impl Action {
    pub fn is_delete(self) -> bool {
        matches!(self, Self::DeleteFile | Self::DeleteDir)
    }

    pub fn is_create(self) -> bool {
        matches!(self, Self::NewFile | Self::NewDir)
    }

    /// Stable kebab-case name, e.g. `delete-dir`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeleteFile  => "delete-file",
            Self::DeleteDir   => "delete-dir",
            Self::ReplaceFile => "replace-file",
            Self::NewFile     => "new-file",
            Self::NewDir      => "new-dir",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned mutation, keyed by entry name within its level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub action:  Action,
    pub subject: OsString,
}

impl Instruction {
    pub fn new(action: Action, subject: impl Into<OsString>) -> Self {
        Self {
            action,
            subject: subject.into(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.subject.to_string_lossy())
    }
}

/// Output of one planning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Instructions in the order they must be applied: all target-driven
    /// decisions (deletes and replacements) first, then creations.
    pub instructions: Vec<Instruction>,

    /// Names that are directories on the source side after this level is
    /// applied, in registration order. The executor descends into each.
    pub directories: Vec<OsString>,
}

// ---------------------------------------------------------------------------
// plan()
// ---------------------------------------------------------------------------

/// Reconcile one level of source and target listings into a [`Plan`].
///
/// Pure and deterministic: the same listings and rules always give the same
/// plan, in an order that follows the order of the input slices.
///
/// The first pass walks `target` and emits at most one delete or replace per
/// entry. The second walks `source` and emits creations, registering
/// directories to descend into. A type mismatch under mirror mode is
/// repaired by a delete in the first pass followed by a create of the same
/// name in the second; without mirror mode it is left alone.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, SystemTime};
/// use dirsync::{plan, Action, Entry, EntryKind, Instruction, Rules};
///
/// let file = |name: &str, side: &str, secs: u64| Entry {
///     name:     name.into(),
///     path:     format!("{side}/{name}").into(),
///     kind:     EntryKind::File,
///     modified: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
/// };
///
/// let source = vec![file("a.txt", "src", 20), file("b.txt", "src", 10)];
/// let target = vec![file("a.txt", "dst", 10)];
///
/// let plan = plan(&source, &target, &Rules::default());
/// assert_eq!(plan.instructions, vec![
///     Instruction::new(Action::ReplaceFile, "a.txt"),
///     Instruction::new(Action::NewFile, "b.txt"),
/// ]);
/// ```
pub fn plan(source: &[Entry], target: &[Entry], rules: &Rules) -> Plan {
    let source_by_name: HashMap<&OsStr, &Entry> =
        source.iter().map(|e| (e.name.as_os_str(), e)).collect();
    let target_by_name: HashMap<&OsStr, &Entry> =
        target.iter().map(|e| (e.name.as_os_str(), e)).collect();

    let mut instructions = Vec::new();
    let mut directories  = Vec::new();
    let mut deleted      = HashSet::new();

    // Pass 1: target-driven. Deletes, then replacements.
    for t in target {
        let s = source_by_name.get(t.name.as_os_str()).copied();
        let protected = rules.do_not_delete.is_match(&t.path);

        let unmatched = match s {
            None    => true,
            Some(s) => s.is_dir() != t.is_dir(),
        };

        if rules.mirror && !protected && unmatched {
            let action = if t.is_dir() { Action::DeleteDir } else { Action::DeleteFile };
            instructions.push(Instruction::new(action, t.name.as_os_str()));
            deleted.insert(t.name.as_os_str());
            continue;
        }

        let Some(s) = s else { continue };

        if !s.is_dir()
            && !t.is_dir()
            && !protected
            && !rules.do_not_copy.is_match(&s.path)
            && (!rules.only_copy_if_newer || s.modified > t.modified)
        {
            instructions.push(Instruction::new(Action::ReplaceFile, s.name.as_os_str()));
        }
    }

    // Pass 2: source-driven. Creations and descents.
    for s in source {
        if rules.do_not_copy.is_match(&s.path) {
            continue;
        }

        // A name deleted in pass 1 is recreated with the source's type.
        let existing = target_by_name
            .get(s.name.as_os_str())
            .copied()
            .filter(|_| !deleted.contains(s.name.as_os_str()));

        match existing {
            Some(t) => {
                if s.is_dir() && t.is_dir() {
                    directories.push(s.name.clone());
                }
            }
            None if s.is_dir() => {
                instructions.push(Instruction::new(Action::NewDir, s.name.as_os_str()));
                directories.push(s.name.clone());
            }
            None => {
                instructions.push(Instruction::new(Action::NewFile, s.name.as_os_str()));
            }
        }
    }

    Plan {
        instructions,
        directories,
    }
}
