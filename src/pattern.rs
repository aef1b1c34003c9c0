use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::SyncError;
use crate::traits::PathMatcher;

// ---------------------------------------------------------------------------
// GlobPatterns
// ---------------------------------------------------------------------------

/// A compiled set of glob patterns matched against full path strings.
///
/// `*` stays within one path component and `**` spans any number of them,
/// so `**/2.txt` matches `test/src/2.txt` and `*/src/4.txt` matches
/// `test/src/4.txt` but not `a/test/src/4.txt`. A path is covered when any
/// one pattern matches. The empty set matches nothing.
#[derive(Debug, Clone)]
pub struct GlobPatterns {
    patterns: Vec<String>,
    set:      GlobSet,
}

impl GlobPatterns {
    /// Compile `patterns`, failing on the first one that is not a valid glob.
    pub fn new<I, S>(patterns: I) -> Result<Self, SyncError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .backslash_escape(true)
                .build()
                .map_err(|source| SyncError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
            builder.add(glob);
        }

        let set = builder.build().map_err(|source| SyncError::InvalidPattern {
            pattern: patterns.join(", "),
            source,
        })?;

        Ok(Self { patterns, set })
    }

    /// A set that matches nothing.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set:      GlobSet::empty(),
        }
    }

    /// The source patterns, in the order they were given.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for GlobPatterns {
    fn default() -> Self {
        Self::empty()
    }
}

impl PathMatcher for GlobPatterns {
    fn is_match(&self, path: &Path) -> bool {
        !self.is_empty() && self.set.is_match(path)
    }
}
