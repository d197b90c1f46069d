//! Recency ordering for LRU eviction

use std::collections::VecDeque;

/// Keys ordered from least to most recently used.
///
/// Linear scans are fine here: caches built on this hold a handful of
/// large values, not many small ones.
#[derive(Debug, Clone)]
pub struct RecencyOrder<K> {
    keys: VecDeque<K>,
}

impl<K: PartialEq + Clone> RecencyOrder<K> {
    pub fn new() -> Self {
        Self {
            keys: VecDeque::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Move `key` to the most-recently-used end, adding it if absent
    pub fn touch(&mut self, key: &K) {
        match self.keys.iter().position(|k| k == key) {
            Some(index) if index + 1 == self.keys.len() => {}
            Some(index) => {
                if let Some(existing) = self.keys.remove(index) {
                    self.keys.push_back(existing);
                }
            }
            None => self.keys.push_back(key.clone()),
        }
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.keys.iter().position(|k| k == key) {
            Some(index) => {
                self.keys.remove(index);
                true
            }
            None => false,
        }
    }

    /// Pop the least recently used key
    pub fn pop_lru(&mut self) -> Option<K> {
        self.keys.pop_front()
    }

    /// Least recently used key without removing it
    pub fn lru(&self) -> Option<&K> {
        self.keys.front()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Iterate from least to most recently used
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }
}

impl<K: PartialEq + Clone> Default for RecencyOrder<K> {
    fn default() -> Self {
        Self::new()
    }
}
