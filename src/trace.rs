use std::io::Write;
use std::path::Path;

use crate::plan::{Action, Instruction};
use crate::traits::Reporter;

const RED:   &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Prints one line per instruction to stdout.
///
/// `[-]` in red for deletions, `[r]` uncoloured for replacements, `[+]` in
/// green for creations. Colour can be switched off for non-terminal output.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    color: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { color: true }
    }

    /// Disable ANSI colour codes.
    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Format the trace line for `instruction` without printing it.
    pub fn line(&self, instruction: &Instruction, target: &Path) -> String {
        let (marker, color) = match instruction.action {
            Action::DeleteFile | Action::DeleteDir => ("[-]", RED),
            Action::ReplaceFile                    => ("[r]", ""),
            Action::NewFile | Action::NewDir       => ("[+]", GREEN),
        };

        if self.color && !color.is_empty() {
            format!("{color}{marker} {}{RESET}", target.display())
        } else {
            format!("{marker} {}", target.display())
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn instruction(&self, instruction: &Instruction, target: &Path) {
        let line = self.line(instruction, target);
        // A closed stdout must not fail the sync.
        let _ = writeln!(std::io::stdout().lock(), "{line}");
    }
}

/// Discards the trace.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn instruction(&self, _instruction: &Instruction, _target: &Path) {}
}
