//! # Organize Module
//!
//! Files media into a date-structured archive.
//!
//! ## Pipeline
//! For every file: ignore policy → extension allow-list → creation date (with
//! fallback) → destination folder → directory creation → unique name →
//! move or copy. Each step that can fail turns into a per-file
//! [`SortError`](crate::error::SortError); nothing here aborts a batch.
//!
//! ## Layout
//! `dest/<strftime(date, folder_format) lower-cased>/<lower-cased name>`, with
//! `~` inserted before the extension while a name is taken.

mod mover;
mod perms;
mod planner;
mod report;
mod sorter;
mod types;

pub use mover::{file_mode_for, SafeMover};
pub use planner::{PathPlanner, COLLISION_MARKER};
pub use report::BatchReport;
pub use sorter::Sorter;
pub use types::*;
