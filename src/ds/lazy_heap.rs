//! Lazy min-heap with stale entry skipping.
//!
//! A priority queue that supports cheap score updates by deferring cleanup.
//! Updates push a new heap entry and overwrite the authoritative score; the
//! old heap entry becomes stale and is skipped by
//! [`pop_best`](LazyMinHeap::pop_best).
//!
//! ## Architecture
//!
//! ```text
//!   scores: FxHashMap<K, (S, seq)>      authoritative, one row per live key
//!   heap:   BinaryHeap<Reverse<Entry>>  may hold stale rows
//!
//!   ┌──────────────────────────────┐
//!   │ ("B", 3, seq=5)  ← live      │  scores["B"] == (3, 5)
//!   │ ("C", 7, seq=4)  ← live      │
//!   │ ("A", 10, seq=3) ← live      │
//!   │ ("A", 15, seq=1) ← STALE     │  scores["A"].seq == 3, not 1
//!   └──────────────────────────────┘
//! ```
//!
//! An entry is live iff its sequence number matches the one stored for its
//! key, so a key that is removed and re-added with an identical score never
//! resurrects its old heap row.
//!
//! ## Ordering
//!
//! Entries order by `(score, seq)`. Among equal scores the key whose score
//! was assigned earliest pops first.
//!
//! ## Operations
//!
//! | Operation      | Description                           | Complexity         |
//! |----------------|---------------------------------------|--------------------|
//! | `update`       | Set/update score, push heap entry     | O(log n)           |
//! | `remove`       | Remove from scores map only           | O(1)               |
//! | `pop_best`     | Pop min, skipping stale entries       | Amortized O(log n) |
//! | `score_of`     | Get current score for key             | O(1)               |
//! | `rebuild`      | Rebuild heap from scores map          | O(n log n)         |
//! | `maybe_rebuild`| Rebuild if heap too stale             | O(1) or O(n log n) |
//!
//! ## Example Usage
//!
//! ```
//! use depcache::ds::LazyMinHeap;
//!
//! let mut heap: LazyMinHeap<&str, u32> = LazyMinHeap::new();
//! heap.update("task_a", 5);
//! heap.update("task_b", 2);
//! heap.update("task_a", 1);
//!
//! assert_eq!(heap.pop_best(), Some(("task_a", 1)));
//! assert_eq!(heap.pop_best(), Some(("task_b", 2)));
//! assert_eq!(heap.pop_best(), None);
//! ```
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::hash::Hash;

use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct HeapEntry<K, S> {
    score: S,
    seq: u64,
    key: K,
}

impl<K, S: Ord> PartialEq for HeapEntry<K, S> {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.seq == other.seq
    }
}

impl<K, S: Ord> Eq for HeapEntry<K, S> {}

impl<K, S: Ord> PartialOrd for HeapEntry<K, S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K, S: Ord> Ord for HeapEntry<K, S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-heap with cheap score updates via lazy deletion.
///
/// # Type Parameters
///
/// - `K`: Key type (must be `Eq + Hash + Clone`)
/// - `S`: Score type (must be `Ord + Clone`)
#[derive(Debug)]
pub struct LazyMinHeap<K, S> {
    scores: FxHashMap<K, (S, u64)>,
    heap: BinaryHeap<Reverse<HeapEntry<K, S>>>,
    seq: u64,
}

impl<K, S> LazyMinHeap<K, S>
where
    K: Eq + Hash + Clone,
    S: Ord + Clone,
{
    pub fn new() -> Self {
        Self {
            scores: FxHashMap::default(),
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    /// Reserves room for `additional` more live keys.
    pub fn reserve(&mut self, additional: usize) {
        self.scores.reserve(additional);
        self.heap.reserve(additional);
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Number of heap rows, stale ones included.
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.scores.contains_key(key)
    }

    pub fn score_of(&self, key: &K) -> Option<&S> {
        self.scores.get(key).map(|(score, _)| score)
    }

    /// Sets the score for `key`, returning the previous one.
    pub fn update(&mut self, key: K, score: S) -> Option<S> {
        let seq = self.next_seq();
        self.heap.push(Reverse(HeapEntry {
            score: score.clone(),
            seq,
            key: key.clone(),
        }));
        self.scores.insert(key, (score, seq)).map(|(old, _)| old)
    }

    /// Removes `key`; its heap rows become stale.
    pub fn remove(&mut self, key: &K) -> Option<S> {
        self.scores.remove(key).map(|(score, _)| score)
    }

    /// Removes and returns the key with the minimum `(score, seq)`.
    pub fn pop_best(&mut self) -> Option<(K, S)> {
        while let Some(Reverse(entry)) = self.heap.pop() {
            let live = matches!(self.scores.get(&entry.key), Some((_, seq)) if *seq == entry.seq);
            if live {
                self.scores.remove(&entry.key);
                return Some((entry.key, entry.score));
            }
        }
        None
    }

    /// Rebuilds the heap from the live scores, dropping stale rows.
    ///
    /// Sequence numbers are preserved so tie-break order is unchanged.
    pub fn rebuild(&mut self) {
        self.heap = self
            .scores
            .iter()
            .map(|(key, (score, seq))| {
                Reverse(HeapEntry {
                    score: score.clone(),
                    seq: *seq,
                    key: key.clone(),
                })
            })
            .collect();
    }

    /// Rebuilds when the heap holds more than `factor` rows per live key.
    pub fn maybe_rebuild(&mut self, factor: usize) {
        if self.heap.len() > self.scores.len().max(1).saturating_mul(factor.max(1)) {
            self.rebuild();
        }
    }

    pub fn clear(&mut self) {
        self.scores.clear();
        self.heap.clear();
        self.seq = 0;
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert!(self.heap.len() >= self.scores.len());
        for (key, (_, seq)) in &self.scores {
            let rows = self
                .heap
                .iter()
                .filter(|Reverse(e)| e.key == *key && e.seq == *seq)
                .count();
            assert_eq!(rows, 1, "every live key has exactly one live heap row");
        }
    }
}

impl<K, S> Default for LazyMinHeap<K, S>
where
    K: Eq + Hash + Clone,
    S: Ord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
