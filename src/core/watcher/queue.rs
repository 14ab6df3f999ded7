//! Pending-path queue shared between the event consumer and the drainer.

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A filesystem change relevant to the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathChange {
    /// The file appeared or its contents changed
    Upsert(PathBuf),
    /// The file is gone
    Remove(PathBuf),
}

impl PathChange {
    pub fn path(&self) -> &Path {
        match self {
            PathChange::Upsert(path) | PathChange::Remove(path) => path,
        }
    }

    /// Translate a notify event into queue changes
    ///
    /// A rename becomes a removal of the old name plus an upsert of the new
    /// one. Access and unclassified events produce nothing.
    pub fn from_notify(event: Event) -> Vec<PathChange> {
        match event.kind {
            EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Metadata(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Other) => {
                event.paths.into_iter().map(PathChange::Upsert).collect()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let mut paths = event.paths.into_iter();
                let mut changes = Vec::new();
                if let Some(from) = paths.next() {
                    changes.push(PathChange::Remove(from));
                }
                changes.extend(paths.map(PathChange::Upsert));
                changes
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => {
                event.paths.into_iter().map(PathChange::Remove).collect()
            }
            EventKind::Modify(ModifyKind::Name(_)) => event
                .paths
                .into_iter()
                .map(|path| {
                    if path.exists() {
                        PathChange::Upsert(path)
                    } else {
                        PathChange::Remove(path)
                    }
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Ordered, duplicate-free set of paths waiting to be sorted
#[derive(Debug)]
pub struct EventQueue {
    pending: BTreeSet<PathBuf>,
    last_activity: Instant,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            pending: BTreeSet::new(),
            last_activity: Instant::now(),
        }
    }

    /// Apply a change and mark activity
    pub fn apply(&mut self, change: PathChange) {
        match change {
            PathChange::Upsert(path) => {
                tracing::debug!("queued {}", path.display());
                self.pending.insert(path);
            }
            PathChange::Remove(path) => {
                if self.pending.remove(&path) {
                    tracing::debug!("dequeued {}", path.display());
                }
            }
        }
        self.touch();
    }

    /// Restart the idle clock
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Time since the last change or [`touch`](Self::touch)
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Take every pending path, leaving an empty queue behind
    pub fn take(&mut self) -> BTreeSet<PathBuf> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.pending.contains(path)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, RemoveKind};

    #[test]
    fn repeated_upserts_coalesce() {
        let mut queue = EventQueue::new();
        queue.apply(PathChange::Upsert(PathBuf::from("/import/a.jpg")));
        queue.apply(PathChange::Upsert(PathBuf::from("/import/a.jpg")));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn remove_drops_pending_path() {
        let mut queue = EventQueue::new();
        queue.apply(PathChange::Upsert(PathBuf::from("/import/a.jpg")));
        queue.apply(PathChange::Remove(PathBuf::from("/import/a.jpg")));
        queue.apply(PathChange::Remove(PathBuf::from("/import/never.jpg")));
        assert!(queue.is_empty());
    }

    #[test]
    fn take_swaps_for_empty_set() {
        let mut queue = EventQueue::new();
        queue.apply(PathChange::Upsert(PathBuf::from("/import/b.jpg")));
        queue.apply(PathChange::Upsert(PathBuf::from("/import/a.jpg")));

        let batch: Vec<_> = queue.take().into_iter().collect();

        assert_eq!(
            batch,
            vec![PathBuf::from("/import/a.jpg"), PathBuf::from("/import/b.jpg")]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn activity_resets_idle_clock() {
        let mut queue = EventQueue::new();
        std::thread::sleep(Duration::from_millis(20));
        assert!(queue.idle_for() >= Duration::from_millis(20));
        queue.apply(PathChange::Upsert(PathBuf::from("/import/a.jpg")));
        assert!(queue.idle_for() < Duration::from_millis(20));
    }

    #[test]
    fn notify_rename_becomes_remove_and_upsert() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/import/a.tmp"))
            .add_path(PathBuf::from("/import/a.jpg"));

        assert_eq!(
            PathChange::from_notify(event),
            vec![
                PathChange::Remove(PathBuf::from("/import/a.tmp")),
                PathChange::Upsert(PathBuf::from("/import/a.jpg")),
            ]
        );
    }

    #[test]
    fn notify_create_and_remove() {
        let created = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/import/a.jpg"));
        let removed = Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/import/a.jpg"));

        assert_eq!(
            PathChange::from_notify(created),
            vec![PathChange::Upsert(PathBuf::from("/import/a.jpg"))]
        );
        assert_eq!(
            PathChange::from_notify(removed),
            vec![PathChange::Remove(PathBuf::from("/import/a.jpg"))]
        );
    }

    #[test]
    fn access_events_are_dropped() {
        let event = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/import/a.jpg"));
        assert!(PathChange::from_notify(event).is_empty());
    }
}
