//! Per-file sorting pipeline, batch sort and empty-directory pruning.

use super::mover::SafeMover;
use super::planner::PathPlanner;
use super::report::BatchReport;
use super::types::SorterConfig;
use crate::core::metadata::{self, DateFallback};
use crate::core::scanner::{remove_junk, EntryAction, WalkDirScanner};
use crate::error::{DateError, MediaSorterError, ScanError, SortError};
use crate::events::{null_sender, Event, EventSender, SortEvent};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files media into a date-structured archive
pub struct Sorter {
    config: SorterConfig,
    events: EventSender,
}

impl Sorter {
    /// Create a sorter, rejecting configurations that cannot work
    pub fn new(config: SorterConfig) -> Result<Self, MediaSorterError> {
        config.validate()?;
        Ok(Self {
            config,
            events: null_sender(),
        })
    }

    /// Report per-file outcomes on `events`
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &SorterConfig {
        &self.config
    }

    /// Sort a single file into the archive
    ///
    /// Returns the destination path. Hidden and housekeeping names come back
    /// as [`SortError::Ignored`], names outside the allow-list as
    /// [`SortError::UnsupportedExtension`], and any I/O problem along the way
    /// as [`SortError::Failed`].
    pub fn sort_file(&self, src: &Path) -> Result<PathBuf, SortError> {
        let outcome = self.place(src);
        match &outcome {
            Ok(destination) => self.events.send(Event::Sort(SortEvent::Placed {
                source: src.to_path_buf(),
                destination: destination.clone(),
            })),
            Err(SortError::Failed { source, .. }) => {
                self.events.send(Event::Sort(SortEvent::Failed {
                    path: src.to_path_buf(),
                    message: source.to_string(),
                }))
            }
            Err(_) => self.events.send(Event::Sort(SortEvent::Skipped {
                path: src.to_path_buf(),
            })),
        }
        outcome
    }

    fn place(&self, src: &Path) -> Result<PathBuf, SortError> {
        if self.config.policy.is_ignored(src) {
            return Err(SortError::Ignored {
                path: src.to_path_buf(),
            });
        }
        if !metadata::is_supported(src) {
            return Err(SortError::UnsupportedExtension {
                path: src.to_path_buf(),
                extension: metadata::extension_of(src).unwrap_or_default(),
            });
        }

        let failed = |source: io::Error| SortError::Failed {
            path: src.to_path_buf(),
            source,
        };

        let src_info = fs::symlink_metadata(src).map_err(failed)?;
        if !src_info.is_file() {
            return Err(failed(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }

        let basename = src
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                failed(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "file name is not valid UTF-8",
                ))
            })?;

        let folder = self.destination_folder(src).map_err(failed)?;
        let folder = self.config.destination.join(folder);
        PathPlanner::make_dirs(&self.config.destination, &folder, self.config.dry_run)
            .map_err(failed)?;

        let destination = PathPlanner::unique_name(&folder, basename);
        SafeMover::place(src, &destination, self.config.operation, self.config.dry_run)
            .map_err(failed)?;

        Ok(destination)
    }

    /// Folder below the archive root, from the file's date or the fallback
    fn destination_folder(&self, src: &Path) -> io::Result<String> {
        let format = &self.config.folder_format;
        match metadata::resolve(src) {
            Ok(date) => PathPlanner::folder_name(&date, format),
            Err(DateError::Readout { reason, .. }) => {
                tracing::debug!("no date in {}: {}", src.display(), reason);
                match &self.config.fallback {
                    DateFallback::FileTimestamp => {
                        let date = metadata::file_timestamp(src)?;
                        PathPlanner::folder_name(&date, format)
                    }
                    DateFallback::Bucket(name) => Ok(name.clone()),
                }
            }
            Err(e @ DateError::UnsupportedExtension { .. }) => {
                Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))
            }
        }
    }

    /// Sort every eligible file below `base`
    ///
    /// Junk found on the way is deleted. Unsupported files are reported as
    /// failures, ignored ones are skipped.
    pub fn sort_tree(&self, base: &Path) -> Result<BatchReport, ScanError> {
        let scanner = WalkDirScanner::new(self.config.policy.clone());
        let found = scanner.scan_with_events(base, &self.events)?;
        remove_junk(&found.junk, self.config.dry_run);

        let mut report = BatchReport::new(base);
        for file in &found.files {
            report.record(file, self.sort_file(file), true);
        }
        Ok(report)
    }

    /// Remove directories below `base` that no longer hold anything useful
    ///
    /// Junk directories and files are deleted wherever they are found. A
    /// directory is removed when everything left in it is hidden or junk.
    /// Hidden directories are not descended into and `base` is never removed.
    /// Returns the removed paths.
    pub fn prune(&self, base: &Path) -> Vec<PathBuf> {
        let policy = &self.config.policy;
        let mut junk = Vec::new();
        let mut dirs = Vec::new();

        let mut walker = WalkDir::new(base)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !(entry.file_type().is_dir()
                        && policy.classify_dir(&entry.file_name().to_string_lossy())
                            == EntryAction::Ignore)
            });

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("prune: {}", e);
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_dir() {
                if policy.classify_dir(&name) == EntryAction::Erase {
                    junk.push(entry.path().to_path_buf());
                    walker.skip_current_dir();
                } else {
                    dirs.push(entry.path().to_path_buf());
                }
            } else if policy.classify_file(&name) == EntryAction::Erase {
                junk.push(entry.path().to_path_buf());
            }
        }

        let mut removed = remove_junk(&junk, self.config.dry_run);
        let mut gone: HashSet<PathBuf> = removed.iter().cloned().collect();

        // children were visited after their parents
        for dir in dirs.iter().rev() {
            match self.is_disposable_dir(dir, &gone) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::debug!("prune: cannot read {}: {}", dir.display(), e);
                    continue;
                }
            }

            tracing::info!("rm -rf {}/", dir.display());
            if !self.config.dry_run {
                if let Err(e) = fs::remove_dir_all(dir) {
                    tracing::warn!("cannot remove {}: {}", dir.display(), e);
                    continue;
                }
            }
            gone.insert(dir.clone());
            removed.push(dir.clone());
        }

        removed
    }

    fn is_disposable_dir(&self, dir: &Path, gone: &HashSet<PathBuf>) -> io::Result<bool> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if gone.contains(&path) {
                continue;
            }
            let name = entry.file_name();
            let is_dir = entry.file_type()?.is_dir();
            if !self
                .config
                .policy
                .is_disposable(&name.to_string_lossy(), is_dir)
            {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
