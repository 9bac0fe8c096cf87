//! Analysis layer: everything derived from a filtered view.
//!
//! ```text
//!   FilteredView
//!     │        │
//!     ▼        ▼
//! ┌──────────┐ ┌──────┐
//! │ aggregate │ │ text │   counts, rankings, metrics / word frequencies
//! └──────────┘ └──────┘
//! ```
//!
//! Rankings share one rule: descending count, ties kept in the order the
//! values were first encountered in the view.

use std::hash::Hash;

use indexmap::IndexMap;

pub mod aggregate;
pub mod text;

/// Occurrence counter that remembers first-encounter order.
#[derive(Debug, Clone)]
pub struct FrequencyCounter<K: Hash + Eq> {
    counts: IndexMap<K, usize>,
}

impl<K: Hash + Eq> Default for FrequencyCounter<K> {
    fn default() -> Self {
        Self {
            counts: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq> FrequencyCounter<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: K) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Distinct keys in first-encountered order.
    pub fn into_keys(self) -> Vec<K> {
        self.counts.into_keys().collect()
    }

    /// All entries by descending count. The sort is stable, so equal counts
    /// stay in first-encountered order.
    pub fn ranked(self) -> Vec<(K, usize)> {
        let mut entries: Vec<(K, usize)> = self.counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }

    /// The `n` highest-count entries.
    pub fn top(self, n: usize) -> Vec<(K, usize)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    /// The single most frequent key; the earliest one wins a tie.
    pub fn most_frequent(self) -> Option<(K, usize)> {
        let mut best: Option<(K, usize)> = None;
        for (key, count) in self.counts {
            match &best {
                Some((_, best_count)) if count <= *best_count => {}
                _ => best = Some((key, count)),
            }
        }
        best
    }
}

impl<K: Hash + Eq> Extend<K> for FrequencyCounter<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.add(key);
        }
    }
}

impl<K: Hash + Eq> FromIterator<K> for FrequencyCounter<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut counter = FrequencyCounter::new();
        counter.extend(iter);
        counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranked_keeps_first_encountered_order_on_ties() {
        let counter: FrequencyCounter<&str> = ["b", "a", "c", "a", "b", "d"].into_iter().collect();
        assert_eq!(counter.ranked(), vec![("b", 2), ("a", 2), ("c", 1), ("d", 1)]);
    }

    #[test]
    fn top_truncates() {
        let counter: FrequencyCounter<&str> = ["x", "y", "y"].into_iter().collect();
        assert_eq!(counter.clone().top(1), vec![("y", 2)]);
        assert_eq!(counter.top(10).len(), 2);
    }

    #[test]
    fn most_frequent_prefers_earliest_tie() {
        let counter: FrequencyCounter<i32> = [2021, 2020, 2020, 2021].into_iter().collect();
        assert_eq!(counter.most_frequent(), Some((2021, 2)));
        assert_eq!(FrequencyCounter::<i32>::new().most_frequent(), None);
    }
}
