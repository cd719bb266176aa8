//! In-memory collection of completed entries, newest first.

use std::collections::VecDeque;
use std::collections::vec_deque;

use crate::entry::TimeEntry;
use crate::types::EntryId;

/// Ordered store of recorded entries.
///
/// Newest-first is the storage order itself: [`EntryStore::append`] pushes to
/// the front and nothing re-sorts at read time. Entries are only ever added or
/// removed, never modified.
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    entries: VecDeque<TimeEntry>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry as the most recent one.
    pub fn append(&mut self, entry: TimeEntry) {
        tracing::info!(
            id = %entry.id(),
            project = entry.project(),
            seconds = entry.duration_secs(),
            "entry recorded"
        );
        self.entries.push_front(entry);
    }

    /// Removes the entry with `id`, returning it. Unknown ids are a no-op.
    pub fn remove(&mut self, id: EntryId) -> Option<TimeEntry> {
        let Some(index) = self.entries.iter().position(|e| e.id() == id) else {
            tracing::debug!(%id, "no entry to remove");
            return None;
        };
        let removed = self.entries.remove(index);
        tracing::info!(%id, "entry removed");
        removed
    }

    /// Read-only view of the entries, newest first.
    pub const fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            entries: &self.entries,
        }
    }

    /// Finds the single entry whose id starts with `prefix` (case-insensitive).
    ///
    /// Returns `None` for an empty prefix or when several entries match.
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&TimeEntry> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return None;
        }
        let mut matches = self
            .entries
            .iter()
            .filter(|e| e.id().to_string().starts_with(&prefix));
        let found = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(found)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Borrowed, newest-first view of an [`EntryStore`].
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    entries: &'a VecDeque<TimeEntry>,
}

impl<'a> Snapshot<'a> {
    pub fn iter(&self) -> vec_deque::Iter<'a, TimeEntry> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently recorded entry.
    pub fn latest(&self) -> Option<&'a TimeEntry> {
        self.entries.front()
    }
}

impl<'a> IntoIterator for Snapshot<'a> {
    type Item = &'a TimeEntry;
    type IntoIter = vec_deque::Iter<'a, TimeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
