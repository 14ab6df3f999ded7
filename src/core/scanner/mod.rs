//! # Scanner Module
//!
//! Discovers candidate media files in an import folder.
//!
//! ## Ignore policy
//! - dot-prefixed files and directories are never processed
//! - `.Icon` is ignored as well
//! - camera scratch directories (`MISC`, `CANONMSC`) and `.DS_Store` files are
//!   deleted rather than skipped
//!
//! The scanner does not check extensions: unsupported files are still
//! returned so that a batch sort can report them.
//!
//! ## Example
//! ```rust,ignore
//! use media_sorter::core::scanner::{IgnorePolicy, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(IgnorePolicy::default());
//! let found = scanner.scan(Path::new("/share/import"))?;
//! ```

mod filter;
mod walker;

pub use filter::{EntryAction, IgnorePolicy};
pub use walker::{remove_junk, ScanResult, WalkDirScanner};
