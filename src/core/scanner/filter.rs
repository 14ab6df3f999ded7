//! Ignore policy for hidden entries and camera housekeeping files.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Component, Path};

/// What to do with a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    /// Eligible for processing (files) or descent (directories)
    Keep,
    /// Never processed, left untouched
    Ignore,
    /// Housekeeping junk that is deleted outright
    Erase,
}

/// Decides which entries of an import folder are media candidates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnorePolicy {
    /// Directory names deleted recursively (camera scratch folders)
    erase_dirs: HashSet<String>,
    /// File names deleted on sight (desktop metadata)
    erase_files: HashSet<String>,
    /// File names ignored besides dot-prefixed ones
    ignore_files: HashSet<String>,
}

impl IgnorePolicy {
    /// Create a policy with the default junk names
    pub fn new() -> Self {
        Self {
            erase_dirs: ["MISC", "CANONMSC"].iter().map(|s| s.to_string()).collect(),
            erase_files: [".DS_Store"].iter().map(|s| s.to_string()).collect(),
            ignore_files: [".Icon"].iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Add a directory name that should be deleted when found
    pub fn with_erase_dir(mut self, name: impl Into<String>) -> Self {
        self.erase_dirs.insert(name.into());
        self
    }

    /// Add a file name that should be deleted when found
    pub fn with_erase_file(mut self, name: impl Into<String>) -> Self {
        self.erase_files.insert(name.into());
        self
    }

    /// Classify a directory by name
    pub fn classify_dir(&self, name: &str) -> EntryAction {
        if name.starts_with('.') {
            EntryAction::Ignore
        } else if self.erase_dirs.contains(name) {
            EntryAction::Erase
        } else {
            EntryAction::Keep
        }
    }

    /// Classify a file by name
    pub fn classify_file(&self, name: &str) -> EntryAction {
        // junk names are often hidden too, so erasure wins
        if self.erase_files.contains(name) {
            EntryAction::Erase
        } else if name.starts_with('.') || self.ignore_files.contains(name) {
            EntryAction::Ignore
        } else {
            EntryAction::Keep
        }
    }

    /// True if this name would be ignored or erased rather than kept
    pub fn is_disposable(&self, name: &str, is_dir: bool) -> bool {
        let action = if is_dir {
            self.classify_dir(name)
        } else {
            self.classify_file(name)
        };
        action != EntryAction::Keep
    }

    /// Check a file by its own name only
    pub fn is_ignored(&self, path: &Path) -> bool {
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => self.classify_file(name) != EntryAction::Keep,
            None => true,
        }
    }

    /// Check a file and every directory between `root` and it
    ///
    /// Paths outside `root` are judged by their file name only.
    pub fn is_ignored_within(&self, root: &Path, path: &Path) -> bool {
        if self.is_ignored(path) {
            return true;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };
        let parent_components = relative.parent().map(|p| p.components());
        parent_components
            .into_iter()
            .flatten()
            .filter_map(|c| match c {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .any(|name| self.classify_dir(name) != EntryAction::Keep)
    }
}

impl Default for IgnorePolicy {
    fn default() -> Self {
        Self::new()
    }
}
