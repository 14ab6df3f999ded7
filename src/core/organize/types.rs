//! Types for the organize module.

use crate::core::metadata::DateFallback;
use crate::core::scanner::IgnorePolicy;
use crate::error::MediaSorterError;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default archive layout, e.g. `2024/january/15.01.2024`
pub const DEFAULT_FOLDER_FORMAT: &str = "%Y/%B/%d.%m.%Y";

/// Operation mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    /// Move files to destination
    #[default]
    Move,
    /// Copy files to destination (keep originals)
    Copy,
}

impl std::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationMode::Move => write!(f, "move"),
            OperationMode::Copy => write!(f, "copy"),
        }
    }
}

/// Configuration for sorting files into the archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SorterConfig {
    /// Root of the date-structured archive
    pub destination: PathBuf,
    /// strftime-style template for the folder below `destination`
    pub folder_format: String,
    /// What to do with files that carry no readable date
    pub fallback: DateFallback,
    /// Move or copy
    pub operation: OperationMode,
    /// Log every action without touching the filesystem
    pub dry_run: bool,
    /// Hidden/junk handling
    pub policy: IgnorePolicy,
}

impl SorterConfig {
    /// Create a configuration with defaults for everything but the destination
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            folder_format: DEFAULT_FOLDER_FORMAT.to_string(),
            fallback: DateFallback::default(),
            operation: OperationMode::default(),
            dry_run: false,
            policy: IgnorePolicy::default(),
        }
    }

    pub fn with_folder_format(mut self, format: impl Into<String>) -> Self {
        self.folder_format = format.into();
        self
    }

    pub fn with_fallback(mut self, fallback: DateFallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_operation(mut self, operation: OperationMode) -> Self {
        self.operation = operation;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_policy(mut self, policy: IgnorePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reject configurations that could never sort a single file
    pub fn validate(&self) -> Result<(), MediaSorterError> {
        if self.folder_format.trim().is_empty() {
            return Err(MediaSorterError::Config(
                "folder format must not be empty".to_string(),
            ));
        }
        if StrftimeItems::new(&self.folder_format).any(|item| matches!(item, Item::Error)) {
            return Err(MediaSorterError::Config(format!(
                "invalid folder format \"{}\"",
                self.folder_format
            )));
        }
        if let DateFallback::Bucket(name) = &self.fallback {
            if name.trim().is_empty() {
                return Err(MediaSorterError::Config(
                    "no-date bucket name must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
