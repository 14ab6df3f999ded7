//! # Core Module
//!
//! The terminal-agnostic sorting and deduplication engine.
//!
//! ## Modules
//! - `metadata` - Resolves creation dates from embedded metadata
//! - `scanner` - Walks import folders, applying the ignore policy
//! - `organize` - Plans destinations and moves files into the archive
//! - `watcher` - Watches an import folder and sorts it in quiet periods
//! - `dedup` - Finds identical files and recommends what to erase

pub mod dedup;
pub mod metadata;
pub mod organize;
pub mod scanner;
pub mod watcher;

// Re-export commonly used types
pub use dedup::{DuplicateGroup, Recommendation};
pub use metadata::{DateFallback, MediaKind};
pub use organize::{BatchReport, OperationMode, Sorter, SorterConfig};
pub use scanner::IgnorePolicy;
pub use watcher::{Notifier, WatchConfig, WatchSorter};
