//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the sorter and the duplicate finder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Import-folder scanning events
    Scan(ScanEvent),
    /// Per-file sorting events
    Sort(SortEvent),
    /// Folder watcher lifecycle events
    Watch(WatchEvent),
    /// Duplicate search events
    Dedup(DedupEvent),
}

/// Events during a scan of an import folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { root: PathBuf },
    /// A candidate file was found
    FileFound { path: PathBuf },
    /// Scanning completed
    Completed { total_files: usize },
}

/// Events for individual files going through the sorter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SortEvent {
    /// A file was placed in the archive
    Placed { source: PathBuf, destination: PathBuf },
    /// A file could not be placed
    Failed { path: PathBuf, message: String },
    /// A file was skipped (ignored or unsupported)
    Skipped { path: PathBuf },
}

/// Events from the folder watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WatchEvent {
    /// Watcher started monitoring a folder
    Started { path: PathBuf },
    /// A batch was captured from the queue
    Draining { pending: usize },
    /// A report was handed to the notifier
    Reported { moved: usize, failed: usize },
    /// Watcher stopped monitoring a folder
    Stopped { path: PathBuf },
    /// An error occurred in the notification backend
    Error { message: String },
}

/// Stages of the duplicate hash cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DedupStage {
    Sizing,
    PartialHashing,
    FullHashing,
}

/// Events during a duplicate search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DedupEvent {
    /// A cascade stage started with this many candidates
    StageStarted { stage: DedupStage, candidates: usize },
    /// Duplicate search completed
    Completed { groups: usize },
}

impl std::fmt::Display for DedupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DedupStage::Sizing => write!(f, "Sizing files"),
            DedupStage::PartialHashing => write!(f, "Hashing first kilobyte"),
            DedupStage::FullHashing => write!(f, "Hashing full contents"),
        }
    }
}
