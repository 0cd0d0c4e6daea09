//! Size-weighted hit/miss accounting.
//!
//! Counters accumulate the *size* of the accessed node, not the number of
//! events, so a hit on a 20-unit artifact adds 20 to `hits`. The resulting
//! hit rate is a byte-style ratio rather than an access-count ratio.

/// Size-weighted hit and miss totals owned by a single policy.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SizeCounters {
    hits: f64,
    misses: f64,
}

impl SizeCounters {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_hit(&mut self, size: f64) {
        self.hits += size;
    }

    #[inline]
    pub fn record_miss(&mut self, size: f64) {
        self.misses += size;
    }

    #[inline]
    pub fn hits(&self) -> f64 {
        self.hits
    }

    #[inline]
    pub fn misses(&self) -> f64 {
        self.misses
    }

    /// `hits / (hits + misses)`, or `0.0` before any access.
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        hit_rate(self.hits, self.misses)
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Ratio of `hits` to total accessed size; `0.0` when nothing was accessed.
#[inline]
pub fn hit_rate(hits: f64, misses: f64) -> f64 {
    let total = hits + misses;
    if total > 0.0 {
        hits / total
    } else {
        0.0
    }
}

/// Point-in-time view of a policy, for reporting.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyStats {
    pub name: String,
    pub capacity: usize,
    pub len: usize,
    pub hits: f64,
    pub misses: f64,
    pub hit_rate: f64,
}
