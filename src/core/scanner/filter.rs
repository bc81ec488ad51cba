//! Entry filtering logic for the scanner.

use crate::core::classifier::is_media_extension;
use std::collections::HashSet;
use std::path::Path;

/// Names that are never descended into or yielded, wherever they appear
pub const EXCLUDED_NAMES: &[&str] = &[
    ".",
    "..",
    "node_modules",
    "$RECYCLE.BIN",
    "System Volume Information",
];

/// Decides which directory entries the scanner keeps
pub struct MediaFilter {
    /// Entry names to skip
    excluded: HashSet<String>,
    /// Whether to keep entries whose name starts with '.'
    include_hidden: bool,
}

impl MediaFilter {
    /// Create a new filter with the default exclusions
    pub fn new() -> Self {
        Self {
            excluded: EXCLUDED_NAMES.iter().map(|n| n.to_string()).collect(),
            include_hidden: false,
        }
    }

    /// Include hidden entries (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Whether an entry name is excluded (applies to files and directories)
    pub fn is_excluded_name(&self, name: &str) -> bool {
        if self.excluded.contains(name) {
            return true;
        }
        !self.include_hidden && name.starts_with('.')
    }

    /// Whether a file should be yielded
    pub fn should_include(&self, path: &Path) -> bool {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if self.is_excluded_name(name) {
                return false;
            }
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(is_media_extension)
            .unwrap_or(false)
    }
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::new()
    }
}
