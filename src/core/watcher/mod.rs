//! # Folder Watcher Module
//!
//! Keeps an import folder empty by sorting whatever lands in it.
//!
//! ## Lifecycle
//! `Idle → Watching → (Draining → Watching)* → Stopped`
//!
//! A drain runs inside [`WatchSorter::checkpoint`] or [`WatchSorter::stop`].
//! Other threads (and the notifier) follow the state through a
//! [`WatchStatus`] handle.
//!
//! - [`WatchSorter::start`] queues everything already in the folder, then
//!   subscribes to filesystem events.
//! - Events only touch the queue. Nothing is sorted while files keep
//!   arriving.
//! - The owner calls [`WatchSorter::checkpoint`] periodically. Once the folder
//!   has been quiet for longer than the configured idleness, the queue is
//!   drained, the report handed to the [`Notifier`] and the folder pruned.
//! - [`WatchSorter::stop`] drains one last time regardless of idleness.
//!
//! ## Example
//! ```rust,ignore
//! use media_sorter::core::organize::SorterConfig;
//! use media_sorter::core::watcher::{LogNotifier, WatchConfig, WatchSorter};
//!
//! let config = WatchConfig::new("/share/import", SorterConfig::new("/share/pictures"));
//! let mut watcher = WatchSorter::new(config, Box::new(LogNotifier))?;
//! watcher.start()?;
//! loop {
//!     std::thread::sleep(Duration::from_secs(1));
//!     watcher.checkpoint();
//! }
//! ```

mod notifier;
mod queue;

pub use notifier::{LogNotifier, Notifier};
pub use queue::{EventQueue, PathChange};

use crate::core::organize::{BatchReport, Sorter, SorterConfig};
use crate::core::scanner::{remove_junk, IgnorePolicy, WalkDirScanner};
use crate::error::{MediaSorterError, WatchError};
use crate::events::{null_sender, Event, EventSender, WatchEvent};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

/// Default quiet period before a drain
pub const DEFAULT_IDLENESS: Duration = Duration::from_secs(60);

/// Configuration for the folder watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Import folder to watch (recursively)
    pub base: PathBuf,
    /// Quiet period required before a drain
    pub idleness: Duration,
    /// How drained files are sorted
    pub sorter: SorterConfig,
}

impl WatchConfig {
    pub fn new(base: impl Into<PathBuf>, sorter: SorterConfig) -> Self {
        Self {
            base: base.into(),
            idleness: DEFAULT_IDLENESS,
            sorter,
        }
    }

    pub fn with_idleness(mut self, idleness: Duration) -> Self {
        self.idleness = idleness;
        self
    }
}

/// Where the watcher is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchState {
    Idle,
    Watching,
    Draining,
    Stopped,
}

/// Cloneable read-only view of a watcher's [`WatchState`]
#[derive(Debug, Clone)]
pub struct WatchStatus(Arc<Mutex<WatchState>>);

impl WatchStatus {
    pub fn get(&self) -> WatchState {
        *lock(&self.0)
    }
}

/// Watches an import folder and sorts its contents in quiet periods
pub struct WatchSorter {
    config: WatchConfig,
    sorter: Sorter,
    notifier: Box<dyn Notifier>,
    queue: Arc<Mutex<EventQueue>>,
    report: BatchReport,
    state: Arc<Mutex<WatchState>>,
    watcher: Option<RecommendedWatcher>,
    consumer: Option<JoinHandle<()>>,
    events: EventSender,
}

impl WatchSorter {
    /// Create a watcher for `config.base`
    ///
    /// # Errors
    /// Fails when the base folder is missing or unreadable, or when the
    /// sorter configuration is invalid.
    pub fn new(config: WatchConfig, notifier: Box<dyn Notifier>) -> Result<Self, MediaSorterError> {
        if !config.base.is_dir() {
            return Err(WatchError::WatchFailed {
                path: config.base.clone(),
                reason: "not a directory".to_string(),
            }
            .into());
        }
        fs::read_dir(&config.base).map_err(|e| WatchError::WatchFailed {
            path: config.base.clone(),
            reason: e.to_string(),
        })?;

        let sorter = Sorter::new(config.sorter.clone())?;
        let report = BatchReport::new(&config.base);

        Ok(Self {
            config,
            sorter,
            notifier,
            queue: Arc::new(Mutex::new(EventQueue::new())),
            report,
            state: Arc::new(Mutex::new(WatchState::Idle)),
            watcher: None,
            consumer: None,
            events: null_sender(),
        })
    }

    /// Report lifecycle and per-file events on `events`
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.sorter = self.sorter.with_events(events.clone());
        self.events = events;
        self
    }

    pub fn state(&self) -> WatchState {
        *lock(&self.state)
    }

    /// Handle for following the state from another thread
    pub fn status(&self) -> WatchStatus {
        WatchStatus(Arc::clone(&self.state))
    }

    fn set_state(&self, state: WatchState) {
        *lock(&self.state) = state;
    }

    pub fn base(&self) -> &Path {
        &self.config.base
    }

    /// Number of paths waiting for the next drain
    pub fn pending(&self) -> usize {
        self.lock_queue().len()
    }

    /// Queue the current contents of the folder and start watching it
    pub fn start(&mut self) -> Result<(), WatchError> {
        if self.state() != WatchState::Idle {
            return Err(WatchError::AlreadyStarted);
        }

        self.seed()?;

        let (tx, rx) = crossbeam_channel::unbounded::<PathChange>();
        let events = self.events.clone();
        let mut watcher = notify::recommended_watcher(
            move |result: Result<notify::Event, notify::Error>| match result {
                Ok(event) => {
                    for change in PathChange::from_notify(event) {
                        let _ = tx.send(change);
                    }
                }
                Err(e) => {
                    tracing::warn!("watch error: {}", e);
                    events.send(Event::Watch(WatchEvent::Error {
                        message: e.to_string(),
                    }));
                }
            },
        )
        .map_err(|e| WatchError::InitFailed(e.to_string()))?;

        watcher
            .watch(&self.config.base, RecursiveMode::Recursive)
            .map_err(|e| WatchError::WatchFailed {
                path: self.config.base.clone(),
                reason: e.to_string(),
            })?;

        let queue = Arc::clone(&self.queue);
        let base = self.config.base.clone();
        let policy = self.config.sorter.policy.clone();
        let consumer = std::thread::Builder::new()
            .name("watch-queue".to_string())
            .spawn(move || {
                for change in rx {
                    if admits(&policy, &base, &change) {
                        lock(&queue).apply(change);
                    }
                }
            })
            .map_err(|e| WatchError::InitFailed(e.to_string()))?;

        self.watcher = Some(watcher);
        self.consumer = Some(consumer);
        self.set_state(WatchState::Watching);

        tracing::info!("watching {}", self.config.base.display());
        self.events.send(Event::Watch(WatchEvent::Started {
            path: self.config.base.clone(),
        }));
        Ok(())
    }

    /// Queue every eligible file already in the folder, deleting junk
    fn seed(&self) -> Result<(), WatchError> {
        let scanner = WalkDirScanner::new(self.config.sorter.policy.clone());
        let found = scanner
            .scan(&self.config.base)
            .map_err(|e| WatchError::WatchFailed {
                path: self.config.base.clone(),
                reason: e.to_string(),
            })?;
        remove_junk(&found.junk, self.config.sorter.dry_run);

        let mut queue = self.lock_queue();
        for file in found.files {
            queue.apply(PathChange::Upsert(file));
        }
        tracing::debug!("seeded {} files from {}", queue.len(), self.config.base.display());
        Ok(())
    }

    /// Apply a change to the queue
    ///
    /// Directories and ignored paths are dropped, like events coming from
    /// the filesystem watcher.
    pub fn ingest(&self, change: PathChange) {
        if admits(&self.config.sorter.policy, &self.config.base, &change) {
            self.lock_queue().apply(change);
        }
    }

    /// Drain the queue if the folder has been quiet long enough
    ///
    /// Returns the report handed to the notifier, or `None` if nothing
    /// happened.
    pub fn checkpoint(&mut self) -> Option<BatchReport> {
        let idle = self.lock_queue().idle_for();
        tracing::trace!("check-point (idle for {:?})", idle);
        if idle <= self.config.idleness {
            return None;
        }
        self.flush()
    }

    /// Stop watching, then drain whatever is left
    pub fn stop(&mut self) -> Option<BatchReport> {
        // dropping the watcher closes the channel and ends the consumer
        self.watcher.take();
        if let Some(consumer) = self.consumer.take() {
            if consumer.join().is_err() {
                tracing::warn!("queue consumer panicked");
            }
        }

        let delivered = self.flush();
        self.set_state(WatchState::Stopped);

        tracing::info!("stopped watching {}", self.config.base.display());
        self.events.send(Event::Watch(WatchEvent::Stopped {
            path: self.config.base.clone(),
        }));
        delivered
    }

    fn flush(&mut self) -> Option<BatchReport> {
        let batch = {
            let mut queue = self.lock_queue();
            queue.touch();
            queue.take()
        };

        if batch.is_empty() && self.report.is_empty() {
            tracing::debug!("queue is empty, nothing to report");
            return None;
        }

        let previous = self.state();
        self.set_state(WatchState::Draining);
        self.events.send(Event::Watch(WatchEvent::Draining {
            pending: batch.len(),
        }));

        for path in &batch {
            let outcome = self.sorter.sort_file(path);
            self.report.record(path, outcome, false);
        }

        if let Err(e) = self.notifier.deliver(&self.report) {
            tracing::warn!("{}", e);
            self.events.send(Event::Watch(WatchEvent::Error {
                message: e.to_string(),
            }));
        }
        self.events.send(Event::Watch(WatchEvent::Reported {
            moved: self.report.moved.len(),
            failed: self.report.failed.len(),
        }));

        let delivered = std::mem::replace(&mut self.report, BatchReport::new(&self.config.base));
        self.sorter.prune(&self.config.base);

        self.set_state(previous);
        Some(delivered)
    }

    fn lock_queue(&self) -> MutexGuard<'_, EventQueue> {
        lock(&self.queue)
    }
}

/// Neither the queue nor the state can be left half-written, so poisoning is ignored
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Whether a change should reach the queue
fn admits(policy: &IgnorePolicy, base: &Path, change: &PathChange) -> bool {
    let path = change.path();
    if policy.is_ignored_within(base, path) {
        tracing::debug!("explicitly ignoring {}", path.display());
        return false;
    }
    match change {
        PathChange::Upsert(path) => !path.is_dir(),
        PathChange::Remove(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::fixtures;
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    struct Recorder(Arc<StdMutex<Vec<BatchReport>>>);

    impl Notifier for Recorder {
        fn deliver(&self, report: &BatchReport) -> Result<(), WatchError> {
            self.0.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    struct Failing;

    impl Notifier for Failing {
        fn deliver(&self, _report: &BatchReport) -> Result<(), WatchError> {
            Err(WatchError::NotifyFailed("smtp unreachable".to_string()))
        }
    }

    fn watcher(
        import: &Path,
        archive: &Path,
        idleness: Duration,
    ) -> (WatchSorter, Arc<StdMutex<Vec<BatchReport>>>) {
        let reports = Arc::new(StdMutex::new(Vec::new()));
        let config = WatchConfig::new(import, SorterConfig::new(archive)).with_idleness(idleness);
        let sorter = WatchSorter::new(config, Box::new(Recorder(Arc::clone(&reports)))).unwrap();
        (sorter, reports)
    }

    #[test]
    fn missing_base_is_fatal() {
        let archive = TempDir::new().unwrap();
        let config = WatchConfig::new("/nonexistent/import", SorterConfig::new(archive.path()));
        assert!(WatchSorter::new(config, Box::new(LogNotifier)).is_err());
    }

    #[test]
    fn invalid_format_is_fatal() {
        let import = TempDir::new().unwrap();
        let config = WatchConfig::new(
            import.path(),
            SorterConfig::new("/archive").with_folder_format("%Y/%Q"),
        );
        assert!(WatchSorter::new(config, Box::new(LogNotifier)).is_err());
    }

    #[test]
    fn ingest_drops_ignored_paths_and_directories() {
        let import = TempDir::new().unwrap();
        let archive = TempDir::new().unwrap();
        fs::create_dir(import.path().join("DCIM")).unwrap();
        let (watcher, _) = watcher(import.path(), archive.path(), Duration::ZERO);

        watcher.ingest(PathChange::Upsert(import.path().join(".hidden.jpg")));
        watcher.ingest(PathChange::Upsert(import.path().join(".thumbs/a.jpg")));
        watcher.ingest(PathChange::Upsert(import.path().join("DCIM")));
        assert_eq!(watcher.pending(), 0);

        watcher.ingest(PathChange::Upsert(import.path().join("DCIM/a.jpg")));
        assert_eq!(watcher.pending(), 1);
    }

    #[test]
    fn checkpoint_waits_for_idleness() {
        let import = TempDir::new().unwrap();
        let archive = TempDir::new().unwrap();
        let src = import.path().join("IMG_0001.JPG");
        fs::write(&src, fixtures::jpeg_with_date("2003:12:14 12:01:44")).unwrap();
        let (mut watcher, reports) = watcher(import.path(), archive.path(), Duration::from_secs(3600));

        watcher.ingest(PathChange::Upsert(src.clone()));

        assert!(watcher.checkpoint().is_none());
        assert!(src.exists());
        assert!(reports.lock().unwrap().is_empty());
    }

    #[test]
    fn checkpoint_drains_after_quiet_period() {
        let import = TempDir::new().unwrap();
        let archive = TempDir::new().unwrap();
        fs::create_dir(import.path().join("DCIM")).unwrap();
        let src = import.path().join("DCIM/IMG_0001.JPG");
        fs::write(&src, fixtures::jpeg_with_date("2003:12:14 12:01:44")).unwrap();
        let (mut watcher, reports) = watcher(import.path(), archive.path(), Duration::from_millis(10));

        watcher.ingest(PathChange::Upsert(src.clone()));
        watcher.ingest(PathChange::Upsert(src.clone()));
        std::thread::sleep(Duration::from_millis(30));

        let report = watcher.checkpoint().unwrap();

        assert_eq!(
            report.moved,
            vec![archive.path().join("2003/december/14.12.2003/img_0001.jpg")]
        );
        assert!(report.failed.is_empty());
        assert_eq!(reports.lock().unwrap().len(), 1);
        assert_eq!(watcher.pending(), 0);
        // emptied directory is pruned, the base stays
        assert!(!import.path().join("DCIM").exists());
        assert!(import.path().exists());
        // the report was reset
        assert!(watcher.checkpoint().is_none());
    }

    #[test]
    fn drain_skips_unsupported_and_vanished_is_failed() {
        let import = TempDir::new().unwrap();
        let archive = TempDir::new().unwrap();
        let text = import.path().join("notes.txt");
        fs::write(&text, b"x").unwrap();
        let (mut watcher, _) = watcher(import.path(), archive.path(), Duration::ZERO);

        watcher.ingest(PathChange::Upsert(text.clone()));
        watcher.ingest(PathChange::Upsert(import.path().join("gone.jpg")));
        std::thread::sleep(Duration::from_millis(5));

        let report = watcher.checkpoint().unwrap();

        assert!(report.moved.is_empty());
        assert_eq!(report.failed, vec![import.path().join("gone.jpg")]);
        assert!(text.exists());
    }

    #[test]
    fn notifier_failure_does_not_stop_the_watcher() {
        let import = TempDir::new().unwrap();
        let archive = TempDir::new().unwrap();
        let src = import.path().join("IMG_0001.JPG");
        fs::write(&src, fixtures::jpeg_with_date("2003:12:14 12:01:44")).unwrap();
        let config = WatchConfig::new(import.path(), SorterConfig::new(archive.path()))
            .with_idleness(Duration::ZERO);
        let mut watcher = WatchSorter::new(config, Box::new(Failing)).unwrap();

        watcher.ingest(PathChange::Upsert(src));
        std::thread::sleep(Duration::from_millis(5));

        let report = watcher.checkpoint().unwrap();
        assert_eq!(report.moved.len(), 1);
        assert_eq!(watcher.state(), WatchState::Idle);
    }

    #[test]
    fn notifier_sees_draining_state() {
        let import = TempDir::new().unwrap();
        let archive = TempDir::new().unwrap();
        let src = import.path().join("IMG_0001.JPG");
        fs::write(&src, fixtures::jpeg_with_date("2003:12:14 12:01:44")).unwrap();
        let status: Arc<StdMutex<Option<WatchStatus>>> = Arc::new(StdMutex::new(None));
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let notifier = {
            let status = Arc::clone(&status);
            let seen = Arc::clone(&seen);
            move |_: &BatchReport| -> Result<(), WatchError> {
                if let Some(status) = status.lock().unwrap().as_ref() {
                    seen.lock().unwrap().push(status.get());
                }
                Ok(())
            }
        };
        let config = WatchConfig::new(import.path(), SorterConfig::new(archive.path()))
            .with_idleness(Duration::ZERO);
        let mut watcher = WatchSorter::new(config, Box::new(notifier)).unwrap();
        *status.lock().unwrap() = Some(watcher.status());

        watcher.ingest(PathChange::Upsert(src));
        std::thread::sleep(Duration::from_millis(5));
        watcher.checkpoint().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![WatchState::Draining]);
        assert_eq!(watcher.state(), WatchState::Idle);
        assert_eq!(watcher.status().get(), WatchState::Idle);
    }

    #[test]
    fn start_seeds_existing_files_and_stop_drains() {
        let import = TempDir::new().unwrap();
        let archive = TempDir::new().unwrap();
        let src = import.path().join("IMG_0001.JPG");
        fs::write(&src, fixtures::jpeg_with_date("2003:12:14 12:01:44")).unwrap();
        fs::write(import.path().join(".DS_Store"), b"x").unwrap();
        let (mut watcher, reports) = watcher(import.path(), archive.path(), Duration::from_secs(3600));

        watcher.start().unwrap();
        assert_eq!(watcher.state(), WatchState::Watching);
        assert!(watcher.pending() >= 1);
        assert!(!import.path().join(".DS_Store").exists());
        assert!(matches!(watcher.start(), Err(WatchError::AlreadyStarted)));

        let report = watcher.stop().unwrap();

        assert_eq!(watcher.state(), WatchState::Stopped);
        assert_eq!(report.moved.len(), 1);
        assert!(!src.exists());
        assert_eq!(reports.lock().unwrap().len(), 1);
    }
}
