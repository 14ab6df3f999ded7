//! Batch report accumulated over one or more sorting passes.

use crate::error::SortError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// What happened to the files of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Import folder the batch came from
    pub base: PathBuf,
    /// Destination paths of files placed in the archive
    pub moved: Vec<PathBuf>,
    /// Source paths of files that could not be placed
    pub failed: Vec<PathBuf>,
}

impl BatchReport {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            moved: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// True when there is nothing to tell anyone about
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty() && self.failed.is_empty()
    }

    /// Forget the accumulated lists, keeping the base
    pub fn clear(&mut self) {
        self.moved.clear();
        self.failed.clear();
    }

    /// Append the outcome of one file
    ///
    /// Ignored files are never recorded. Unsupported extensions count as
    /// failures only when `unsupported_is_failure` is set.
    pub fn record(
        &mut self,
        source: &Path,
        outcome: Result<PathBuf, SortError>,
        unsupported_is_failure: bool,
    ) {
        match outcome {
            Ok(destination) => self.moved.push(destination),
            Err(SortError::Ignored { .. }) => {
                tracing::debug!("explicitly ignoring {}", source.display());
            }
            Err(SortError::UnsupportedExtension { extension, .. }) => {
                tracing::debug!(
                    "unsupported extension \"{}\": {}",
                    extension,
                    source.display()
                );
                if unsupported_is_failure {
                    self.failed.push(source.to_path_buf());
                }
            }
            Err(e @ SortError::Failed { .. }) => {
                tracing::warn!("{}", e);
                self.failed.push(source.to_path_buf());
            }
        }
    }

    /// One-line summary suitable for a notification subject
    pub fn subject(&self) -> String {
        if self.moved.is_empty() {
            format!("{} files may need manual intervention", self.failed.len())
        } else {
            format!("Organized {} files for you", self.moved.len())
        }
    }

    /// Plain-text body listing moved and failed files
    pub fn body(&self) -> String {
        let mut body = format!(
            "Summary of actions performed at folder\n\"{}\".\n\n",
            self.base.display()
        );

        if self.moved.is_empty() {
            body.push_str("No files moved\n\n");
        } else {
            body.push_str(&format!(
                "List of files correctly moved ({}):\n\n",
                self.moved.len()
            ));
            for path in &self.moved {
                body.push_str(&format!("{}\n", path.display()));
            }
            body.push('\n');
        }

        if self.failed.is_empty() {
            body.push_str("No problems found!\n");
        } else {
            body.push_str(&format!(
                "List of files that could NOT be moved ({}):\n\n",
                self.failed.len()
            ));
            for path in &self.failed {
                body.push_str(&format!("{}\n", path.display()));
            }
        }

        body
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.subject())?;
        writeln!(f)?;
        write!(f, "{}", self.body())
    }
}
