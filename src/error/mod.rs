//! # Error Module
//!
//! Error types for the media sorter.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, extensions, what went wrong
//! - **Smallest scope** - per-file errors stay per-file, only startup errors
//!   bubble out of the binary

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum MediaSorterError {
    #[error("Date resolution error: {0}")]
    Date(#[from] DateError),

    #[error("Sorting error: {0}")]
    Sort(#[from] SortError),

    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Watcher error: {0}")]
    Watch(#[from] WatchError),

    #[error("Duplicate search error: {0}")]
    Dedup(#[from] DedupError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading a creation date from a media file
#[derive(Error, Debug)]
pub enum DateError {
    /// Metadata is absent or cannot be parsed for a format that should carry it
    #[error("Cannot read creation date from {path}: {reason}")]
    Readout { path: PathBuf, reason: String },

    /// No date parser is registered for this extension
    #[error("Unsupported extension \"{extension}\" for {path}")]
    UnsupportedExtension { path: PathBuf, extension: String },
}

impl DateError {
    pub(crate) fn readout(path: &std::path::Path, reason: impl ToString) -> Self {
        DateError::Readout {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Outcome of a single file that could not be placed in the archive
#[derive(Error, Debug)]
pub enum SortError {
    /// The file matched the ignore policy (hidden, housekeeping)
    #[error("Explicitly ignored: {path}")]
    Ignored { path: PathBuf },

    /// The file extension is not in the allow-list
    #[error("Unsupported extension \"{extension}\" for {path}")]
    UnsupportedExtension { path: PathBuf, extension: String },

    /// Any other failure while planning or placing the file
    #[error("Failed to sort {path}: {source}")]
    Failed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while scanning a directory tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while setting up or tearing down the folder watcher
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {0}")]
    InitFailed(String),

    #[error("Failed to watch {path}: {reason}")]
    WatchFailed { path: PathBuf, reason: String },

    #[error("Watcher is already running")]
    AlreadyStarted,

    #[error("Failed to deliver report: {0}")]
    NotifyFailed(String),
}

/// Errors that abort a duplicate search before it starts
#[derive(Error, Debug)]
pub enum DedupError {
    #[error("No directories given to search for duplicates")]
    NoPaths,

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, MediaSorterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readout_error_includes_path_and_reason() {
        let error = DateError::readout(std::path::Path::new("/import/img.jpg"), "no EXIF");
        let message = error.to_string();
        assert!(message.contains("/import/img.jpg"));
        assert!(message.contains("no EXIF"));
    }

    #[test]
    fn unsupported_extension_names_extension() {
        let error = SortError::UnsupportedExtension {
            path: PathBuf::from("/import/notes.txt"),
            extension: "txt".to_string(),
        };
        assert!(error.to_string().contains("\"txt\""));
    }

    #[test]
    fn errors_convert_into_top_level() {
        let error: MediaSorterError = WatchError::AlreadyStarted.into();
        assert!(matches!(error, MediaSorterError::Watch(_)));
        assert!(error.to_string().starts_with("Watcher error"));
    }
}
