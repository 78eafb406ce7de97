use std::collections::VecDeque;

/// Number of recent lines remembered for de-duplication
pub const DEDUP_CAPACITY: usize = 200;

/// Bounded FIFO of recently emitted line contents
///
/// Kodi sometimes writes the same line twice in quick succession. A line whose
/// trimmed text is still in the window is suppressed. Owned by a single tailer,
/// so no locking.
#[derive(Clone, Debug)]
pub struct RecencyCache {
    /// Trimmed texts, oldest first
    entries: VecDeque<String>,

    /// Maximum capacity
    capacity: usize,
}

impl RecencyCache {
    /// Create a new cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a line, returning true if it was not seen recently
    ///
    /// Blank text is never stored and always reports false.
    pub fn check_and_insert(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() || self.capacity == 0 {
            return !trimmed.is_empty();
        }

        if self.entries.iter().any(|e| e == trimmed) {
            return false;
        }

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(trimmed.to_string());
        true
    }

    /// Forget every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecencyCache {
    fn default() -> Self {
        Self::new(DEDUP_CAPACITY)
    }
}
