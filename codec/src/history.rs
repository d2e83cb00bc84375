//! Sliding window of recently decoded entry names.

use std::num::NonZeroUsize;

/// Names kept for prefix references within one update batch.
pub const NAME_HISTORY_CAPACITY: usize = 32;

/// A fixed-capacity ring buffer of entry names.
///
/// Index 0 is the oldest name still held. When full, pushing a name evicts
/// the oldest one.
#[derive(Debug, Clone)]
pub struct NameHistory {
    entries: Vec<Option<String>>,
    head: usize,
    len: usize,
}

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(NAME_HISTORY_CAPACITY) {
    Some(n) => n,
    None => unreachable!(),
};

impl Default for NameHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl NameHistory {
    /// Creates an empty history holding [`NAME_HISTORY_CAPACITY`] names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty history with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        let cap = capacity.get();
        let mut entries = Vec::with_capacity(cap);
        entries.resize_with(cap, || None);
        Self {
            entries,
            head: 0,
            len: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a name, evicting the oldest when full.
    pub fn push(&mut self, name: String) {
        let cap = self.entries.len();
        if self.len < cap {
            let idx = (self.head + self.len) % cap;
            self.entries[idx] = Some(name);
            self.len += 1;
        } else {
            self.entries[self.head] = Some(name);
            self.head = (self.head + 1) % cap;
        }
    }

    /// Returns the name at `index`, counting from the oldest.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        if index >= self.len {
            return None;
        }
        let idx = (self.head + index) % self.entries.len();
        self.entries[idx].as_deref()
    }

    /// Returns an iterator from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> {
        (0..self.len).filter_map(move |i| self.get(i))
    }
}
