//! Fixed-capacity history with a cursor on the displayed entry.

use std::collections::VecDeque;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{trace, warn};

use crate::model::GeneratedImage;

/// Generated images kept for browsing.
pub const IMAGE_HISTORY_CAPACITY: usize = 3;
/// Refinement instructions kept for reuse.
pub const REFINEMENT_HISTORY_CAPACITY: usize = 2;

/// Entry type of a persisted ring; fixes the ring's capacity.
pub trait HistoryEntry {
    const CAPACITY: usize;
}

impl HistoryEntry for GeneratedImage {
    const CAPACITY: usize = IMAGE_HISTORY_CAPACITY;
}

/// Refinement instructions.
impl HistoryEntry for String {
    const CAPACITY: usize = REFINEMENT_HISTORY_CAPACITY;
}

/// FIFO buffer that evicts its oldest entry once full.
///
/// The cursor is `None` only while the ring is empty; otherwise it always
/// points at a valid entry. Only the entries and the cursor are saved; the
/// capacity comes from the entry type when loading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRing<T> {
    #[serde(skip_serializing)]
    capacity: usize,
    items: VecDeque<T>,
    cursor: Option<usize>,
}

#[derive(Deserialize)]
struct SavedRing<T> {
    #[serde(default = "VecDeque::new")]
    items: VecDeque<T>,
    #[serde(default)]
    cursor: Option<usize>,
}

impl<'de, T> Deserialize<'de> for HistoryRing<T>
where
    T: HistoryEntry + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let saved = SavedRing::<T>::deserialize(deserializer)?;
        Ok(Self::restore(T::CAPACITY, saved.items, saved.cursor))
    }
}

impl HistoryRing<GeneratedImage> {
    pub fn images() -> Self {
        Self::with_capacity(IMAGE_HISTORY_CAPACITY)
    }
}

impl HistoryRing<String> {
    pub fn refinements() -> Self {
        Self::with_capacity(REFINEMENT_HISTORY_CAPACITY)
    }
}

impl<T: HistoryEntry> Default for HistoryRing<T> {
    fn default() -> Self {
        Self::with_capacity(T::CAPACITY)
    }
}

impl<T> HistoryRing<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: VecDeque::with_capacity(capacity),
            cursor: None,
        }
    }

    /// Rebuild a ring from saved parts, dropping the oldest entries beyond
    /// `capacity` and pulling the cursor back into range.
    fn restore(capacity: usize, mut items: VecDeque<T>, cursor: Option<usize>) -> Self {
        let capacity = capacity.max(1);
        let excess = items.len().saturating_sub(capacity);
        if excess > 0 {
            warn!(excess, capacity, "Saved history exceeds capacity, dropping oldest");
            items.drain(..excess);
        }
        let cursor = match (items.len(), cursor) {
            (0, _) => None,
            (len, Some(c)) => Some(c.saturating_sub(excess).min(len - 1)),
            (len, None) => Some(len - 1),
        };
        Self {
            capacity,
            items,
            cursor,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Entry under the cursor.
    pub fn current(&self) -> Option<&T> {
        self.cursor.and_then(|i| self.items.get(i))
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Append an entry and point the cursor at it, evicting the oldest
    /// entries beyond capacity.
    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
            trace!(capacity = self.capacity, "Evicted oldest history entry");
        }
        self.cursor = Some(self.items.len() - 1);
    }

    /// Remove the entry at `index`, keeping the cursor on the entry the user
    /// was viewing. Out-of-range indexes are ignored.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        let removed = self.items.remove(index)?;
        self.cursor = match self.cursor {
            _ if self.items.is_empty() => None,
            Some(c) if index < c => Some(c - 1),
            Some(c) if index == c => Some(index.min(self.items.len() - 1)),
            other => other,
        };
        trace!(index, cursor = ?self.cursor, "Removed history entry");
        Some(removed)
    }

    /// Move the cursor to `index`. Out-of-range indexes are ignored.
    pub fn set_index(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.cursor = Some(index);
            true
        } else {
            false
        }
    }

    /// Move the cursor one entry back. No-op at the oldest entry.
    pub fn previous(&mut self) -> bool {
        match self.cursor {
            Some(c) if c > 0 => self.set_index(c - 1),
            _ => false,
        }
    }

    /// Move the cursor one entry forward. No-op at the newest entry.
    pub fn next(&mut self) -> bool {
        match self.cursor {
            Some(c) => self.set_index(c + 1),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = None;
    }
}
