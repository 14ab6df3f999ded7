//! Directory walking implementation using walkdir.

use super::filter::{EntryAction, IgnorePolicy};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of a scan of an import folder
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Files eligible for sorting, in walk order
    pub files: Vec<PathBuf>,
    /// Junk directories and files found along the way
    pub junk: Vec<PathBuf>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Recursive scanner honouring an [`IgnorePolicy`]
pub struct WalkDirScanner {
    policy: IgnorePolicy,
}

impl WalkDirScanner {
    /// Create a new scanner with the given policy
    pub fn new(policy: IgnorePolicy) -> Self {
        Self { policy }
    }

    /// Scan `root` recursively
    ///
    /// Hidden entries are not descended into nor reported. Junk directories are
    /// reported in `junk` and not descended into.
    pub fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_events(root, &crate::events::null_sender())
    }

    /// Scan with progress reporting via events
    pub fn scan_with_events(&self, root: &Path, events: &EventSender) -> Result<ScanResult, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let mut result = ScanResult::default();
        let policy = &self.policy;

        let mut walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                let action = if entry.file_type().is_dir() {
                    policy.classify_dir(&name)
                } else {
                    policy.classify_file(&name)
                };
                action != EntryAction::Ignore
            });

        while let Some(entry_result) = walker.next() {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    let error = if e.io_error().map(|e| e.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path }
                    } else {
                        ScanError::ReadDirectory {
                            path,
                            source: std::io::Error::other(e.to_string()),
                        }
                    };
                    tracing::warn!("{}", error);
                    result.errors.push(error);
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_dir() {
                if policy.classify_dir(&name) == EntryAction::Erase {
                    result.junk.push(entry.path().to_path_buf());
                    walker.skip_current_dir();
                }
                continue;
            }

            if policy.classify_file(&name) == EntryAction::Erase {
                result.junk.push(entry.path().to_path_buf());
                continue;
            }

            tracing::debug!("found {}", entry.path().display());
            events.send(Event::Scan(ScanEvent::FileFound {
                path: entry.path().to_path_buf(),
            }));
            result.files.push(entry.path().to_path_buf());
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: result.files.len(),
        }));

        Ok(result)
    }
}

/// Delete junk found by a scan
///
/// Returns the entries that were (or, in dry-run, would have been) removed.
/// Failures are logged and skipped.
pub fn remove_junk(junk: &[PathBuf], dry_run: bool) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    for path in junk {
        let is_dir = fs::symlink_metadata(path).map(|m| m.is_dir()).unwrap_or(false);
        if is_dir {
            tracing::info!("rm -rf {}/", path.display());
        } else {
            tracing::info!("rm -f {}", path.display());
        }
        if dry_run {
            removed.push(path.clone());
            continue;
        }
        let outcome = if is_dir {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        match outcome {
            Ok(()) => removed.push(path.clone()),
            Err(e) => tracing::warn!("could not remove {}: {}", path.display(), e),
        }
    }
    removed
}
