//! Metrics hooks for cache operations.
//!
//! [`CacheStore`](crate::store::CacheStore) calls a [`CacheMetrics`]
//! implementation on every lookup, write and clear. The default methods log
//! through the `log` crate; [`NoOpMetrics`] silences them and
//! [`AtomicMetrics`] keeps counters that the admin stats endpoint reports.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a cache miss.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record a cache write.
    fn record_set(&self, key: &str, duration: Duration) {
        debug!("Cache SET: {} took {:?}", key, duration);
    }

    /// Record a full clear.
    fn record_clear(&self, removed: usize) {
        debug!("Cache CLEAR: {} entries", removed);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }

    /// Counter snapshot, if this implementation keeps counters.
    fn snapshot(&self) -> Option<MetricsSnapshot> {
        None
    }
}

/// Metrics implementation that records nothing.
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_set(&self, _key: &str, _duration: Duration) {}
    fn record_clear(&self, _removed: usize) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Point-in-time counter values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub clears: u64,
    pub errors: u64,
}

impl MetricsSnapshot {
    /// Hit ratio in `0.0..=1.0`.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / lookups as f64
    }
}

/// Lock-free counters, cheap to clone (shared `Arc`s).
#[derive(Clone, Default)]
pub struct AtomicMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    sets: Arc<AtomicU64>,
    clears: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheMetrics for AtomicMetrics {
    fn record_hit(&self, key: &str, duration: Duration) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    fn record_miss(&self, key: &str, duration: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    fn record_set(&self, key: &str, duration: Duration) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        debug!("Cache SET: {} took {:?}", key, duration);
    }

    fn record_clear(&self, removed: usize) {
        self.clears.fetch_add(1, Ordering::Relaxed);
        debug!("Cache CLEAR: {} entries", removed);
    }

    fn record_error(&self, key: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        warn!("Cache ERROR for {}: {}", key, error);
    }

    fn snapshot(&self) -> Option<MetricsSnapshot> {
        Some(MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_hit("key", Duration::from_secs(1));
        metrics.record_miss("key", Duration::from_secs(2));
        assert!(metrics.snapshot().is_none());
    }

    #[test]
    fn test_atomic_metrics_counts() {
        let metrics = AtomicMetrics::new();
        let shared = metrics.clone();

        metrics.record_miss("products_5_desc_all", Duration::ZERO);
        metrics.record_set("products_5_desc_all", Duration::ZERO);
        shared.record_hit("products_5_desc_all", Duration::ZERO);
        shared.record_hit("products_5_desc_all", Duration::ZERO);
        metrics.record_clear(1);

        let snap = metrics.snapshot().expect("counters");
        assert_eq!(snap.hits, 2);
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.sets, 1);
        assert_eq!(snap.clears, 1);
        assert_eq!(snap.errors, 0);
        assert!((snap.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_rate_without_lookups() {
        assert_eq!(MetricsSnapshot::default().hit_rate(), 0.0);
    }
}
