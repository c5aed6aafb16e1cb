//! Filesystem events to change sets

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Kind of a filesystem notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Create,
    Update,
    Delete,
}

/// One filesystem notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FsEventKind::Create)
    }

    pub fn updated(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FsEventKind::Update)
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FsEventKind::Delete)
    }
}

/// Updated and deleted paths of one event batch. The sets are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub updated: BTreeSet<PathBuf>,
    pub deleted: BTreeSet<PathBuf>,
    /// Number of raw events in the batch
    pub count: usize,
}

impl ChangeSet {
    /// An empty change set, as used for the first pass
    pub fn empty() -> Self {
        Self::default()
    }

    /// Partition a batch; the last event for a path wins
    pub fn from_events(events: &[FsEvent]) -> Self {
        let mut changes = Self {
            count: events.len(),
            ..Self::default()
        };

        for event in events {
            match event.kind {
                FsEventKind::Create | FsEventKind::Update => {
                    changes.deleted.remove(&event.path);
                    changes.updated.insert(event.path.clone());
                }
                FsEventKind::Delete => {
                    changes.updated.remove(&event.path);
                    changes.deleted.insert(event.path.clone());
                }
            }
        }

        changes
    }

    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Every changed path, updated first
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.updated.iter().chain(self.deleted.iter())
    }

    /// The same batch without the paths `exclude` matches
    pub fn without(&self, exclude: impl Fn(&Path) -> bool) -> Self {
        Self {
            updated: self.updated.iter().filter(|p| !exclude(p)).cloned().collect(),
            deleted: self.deleted.iter().filter(|p| !exclude(p)).cloned().collect(),
            count: self.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partition() {
        let changes = ChangeSet::from_events(&[
            FsEvent::created("/p/a.st"),
            FsEvent::updated("/p/b.st"),
            FsEvent::deleted("/p/c.st"),
        ]);

        assert_eq!(changes.count, 3);
        assert_eq!(
            changes.updated,
            BTreeSet::from([PathBuf::from("/p/a.st"), PathBuf::from("/p/b.st")])
        );
        assert_eq!(changes.deleted, BTreeSet::from([PathBuf::from("/p/c.st")]));
    }

    #[test]
    fn test_last_event_wins() {
        let changes = ChangeSet::from_events(&[
            FsEvent::created("/p/a.st"),
            FsEvent::deleted("/p/a.st"),
            FsEvent::deleted("/p/b.st"),
            FsEvent::created("/p/b.st"),
        ]);

        assert_eq!(changes.updated, BTreeSet::from([PathBuf::from("/p/b.st")]));
        assert_eq!(changes.deleted, BTreeSet::from([PathBuf::from("/p/a.st")]));
        assert_eq!(changes.count, 4);
    }

    #[test]
    fn test_without() {
        let changes = ChangeSet::from_events(&[
            FsEvent::updated("/p/a.st"),
            FsEvent::updated("/p/dist/a.out"),
            FsEvent::deleted("/p/dist/b.out"),
        ]);

        let inputs = changes.without(|p| p.starts_with("/p/dist"));

        assert_eq!(inputs.updated, BTreeSet::from([PathBuf::from("/p/a.st")]));
        assert!(inputs.deleted.is_empty());
        assert_eq!(inputs.count, 3);
        assert!(changes.without(|_| true).is_empty());
        assert!(ChangeSet::empty().is_empty());
    }
}
