//! Path exclusion by literal substring
//!
//! A path is excluded when any pattern occurs anywhere in its string form.
//! Matching is deliberately unanchored: there is no case folding and no
//! awareness of path segments, so `log` excludes `catalog.txt` as well as
//! `logs/`.

use std::path::Path;

/// Ordered set of exclusion patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    patterns: Vec<String>,
}

impl ExclusionSet {
    /// Create an empty set that excludes nothing
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set from the given patterns, in order
    #[must_use]
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated list, discarding entries that are empty after trimming
    #[must_use]
    pub fn from_csv(list: &str) -> Self {
        Self::with_patterns(
            list.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty()),
        )
    }

    /// Append patterns after the existing ones
    pub fn extend<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(patterns.into_iter().map(Into::into));
    }

    /// The patterns in this set
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether the set has no patterns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check whether `path` contains any pattern as a substring
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let path = path.to_string_lossy();
        self.patterns.iter().any(|p| path.contains(p.as_str()))
    }
}
