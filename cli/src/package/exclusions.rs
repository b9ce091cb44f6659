//! Noise exclusion patterns applied at packaging time

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::errors::CliError;

/// Version control metadata, editor backups and log files
pub const NOISE_PATTERNS: &[&str] = &[
    ".git/",
    ".svn/",
    ".hg/",
    "_darcs/",
    "CVS/",
    "*~",
    "\\#*#",
    ".#*",
    "*.swp",
    "*.log",
];

/// Matcher for files that never belong in a deployable archive.
///
/// Uses gitignore semantics, so a directory pattern also excludes everything
/// beneath it.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    matcher: Gitignore,
}

impl NoiseFilter {
    /// Build a filter from gitignore-style patterns
    pub fn new(patterns: &[&str]) -> Result<Self, CliError> {
        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            builder.add_line(None, pattern).map_err(|e| {
                CliError::PackageError(format!("Invalid exclusion pattern '{}': {}", pattern, e))
            })?;
        }
        let matcher = builder
            .build()
            .map_err(|e| CliError::PackageError(e.to_string()))?;
        Ok(Self { matcher })
    }

    /// The built-in pattern set
    pub fn standard() -> Result<Self, CliError> {
        Self::new(NOISE_PATTERNS)
    }

    /// Whether a file (by `/`-separated path relative to the app root) is noise
    pub fn is_noise(&self, relative_path: &str) -> bool {
        self.matcher
            .matched_path_or_any_parents(Path::new(relative_path), false)
            .is_ignore()
    }
}
