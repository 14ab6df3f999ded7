//! # Dedup Module
//!
//! Finds byte-identical files and recommends which copies can go.
//!
//! ## Cascade
//! 1. **Size** - files with a unique size cannot have a duplicate
//! 2. **First kilobyte** - xxh3-64 of the first 1024 bytes, keyed with the size
//! 3. **Full content** - xxh3-128 of the whole file
//!
//! Stages 2 and 3 hash on the rayon pool. Only files that survive every stage
//! with a partner end up in a [`DuplicateGroup`].
//!
//! ## Recommendations
//! [`recommend_action`] never touches the filesystem. It produces a
//! [`Recommendation`] that [`render_listing`] prints for a person and
//! [`render_script`] turns into a reviewable bash script.

mod cascade;
mod recommend;
mod render;

pub use cascade::{check_duplicates, check_duplicates_with_events, PARTIAL_HASH_BYTES};
pub use recommend::{recommend_action, Recommendation};
pub use render::{render_listing, render_script};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use uuid::Uuid;

/// Files sharing the same full-content hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub id: Uuid,
    /// Size of each member in bytes
    pub size: u64,
    /// Canonical paths, at least two
    pub paths: BTreeSet<PathBuf>,
}

impl DuplicateGroup {
    pub fn new(size: u64, paths: BTreeSet<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            size,
            paths,
        }
    }

    /// Bytes that would be freed by keeping a single copy
    pub fn wasted_bytes(&self) -> u64 {
        self.size * (self.paths.len().saturating_sub(1) as u64)
    }
}
