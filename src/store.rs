//! Typed cache store - the single entry point for cached catalog payloads.
//!
//! [`CacheStore`] sits on top of an untyped [`CacheBackend`]. It serialises
//! payloads into versioned envelopes, applies the fixed TTL to every write
//! and reports each operation to a [`CacheMetrics`] implementation.
//!
//! ```text
//! get_or_load(key, loader)
//!   ├─ backend.get(key) ── live entry ──► decode ──► Cached { cached: true }
//!   │                    └ stale envelope ► delete, fall through
//!   └─ loader() ──► Err ──► propagate, nothing stored
//!               └► Ok  ──► put(key) ──► Cached { cached: false }
//! ```

use crate::backend::CacheBackend;
use crate::entity::CacheEntity;
use crate::error::Result;
use crate::key::CacheKey;
use crate::observability::{CacheMetrics, MetricsSnapshot, NoOpMetrics};
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};

/// A payload together with where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    /// `true` when served from a live cache entry.
    pub cached: bool,
}

/// Diagnostic view of one entry, as reported by the admin stats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStats {
    pub key: String,
    pub age_ms: u64,
    /// Size of the stored envelope in bytes.
    pub approx_byte_size: usize,
}

/// Snapshot returned by [`CacheStore::stats`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub entries: Vec<EntryStats>,
    pub metrics: Option<MetricsSnapshot>,
}

/// Typed cache over a byte backend with a fixed TTL.
///
/// The TTL is set at construction and never changes for the lifetime of the
/// store.
pub struct CacheStore<B: CacheBackend> {
    backend: B,
    ttl: Duration,
    metrics: Box<dyn CacheMetrics>,
}

impl<B: CacheBackend> CacheStore<B> {
    pub fn new(backend: B, ttl: Duration) -> Self {
        CacheStore {
            backend,
            ttl,
            metrics: Box::new(NoOpMetrics),
        }
    }

    /// Replace the metrics sink.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Live payload under `key`, if any.
    ///
    /// An entry whose envelope no longer decodes (bad magic, older schema,
    /// corrupted bytes, failed validation) is deleted and reported as absent.
    /// The delete is skipped if the key was rewritten in the meantime.
    pub async fn get<T: CacheEntity>(&self, key: &str) -> Result<Option<T>> {
        let timer = Instant::now();

        let bytes = match self.backend.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.metrics.record_miss(key, timer.elapsed());
                return Ok(None);
            }
            Err(e) => {
                self.metrics.record_error(key, &e.to_string());
                return Err(e);
            }
        };

        match T::deserialize_from_cache(&bytes).and_then(|value| value.validate().map(|_| value)) {
            Ok(value) => {
                self.metrics.record_hit(key, timer.elapsed());
                Ok(Some(value))
            }
            Err(e) if e.is_stale_entry() => {
                warn!("Discarding unreadable {} entry {}: {}", T::kind(), key, e);
                self.metrics.record_error(key, &e.to_string());
                self.backend.delete_if_unchanged(key, &bytes).await?;
                self.metrics.record_miss(key, timer.elapsed());
                Ok(None)
            }
            Err(e) => {
                self.metrics.record_error(key, &e.to_string());
                Err(e)
            }
        }
    }

    /// Upsert `value` under `key` with the store TTL.
    pub async fn put<T: CacheEntity>(&self, key: &str, value: &T) -> Result<()> {
        let timer = Instant::now();

        let bytes = value.serialize_for_cache().map_err(|e| {
            self.metrics.record_error(key, &e.to_string());
            e
        })?;
        self.backend.set(key, bytes, Some(self.ttl)).await?;

        self.metrics.record_set(key, timer.elapsed());
        Ok(())
    }

    /// Cache-first lookup.
    ///
    /// A live entry is returned with `cached: true`. Otherwise `loader` runs;
    /// its error propagates unchanged and nothing is stored. On success the
    /// payload is stored and returned with `cached: false`.
    ///
    /// Concurrent misses on the same key each run their loader; the last
    /// write wins.
    pub async fn get_or_load<T, F, Fut>(&self, key: &CacheKey, loader: F) -> Result<Cached<T>>
    where
        T: CacheEntity,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let timer = Instant::now();
        let key_str = key.to_string();
        debug!("» Cache lookup for {} ({})", key_str, key.kind());

        if let Some(value) = self.get::<T>(&key_str).await? {
            debug!("✓ Served {} from cache in {:?}", key_str, timer.elapsed());
            return Ok(Cached {
                value,
                cached: true,
            });
        }

        let value = loader().await?;
        self.put(&key_str, &value).await?;

        info!(
            "✓ Loaded {} from upstream and cached it in {:?}",
            key_str,
            timer.elapsed()
        );
        Ok(Cached {
            value,
            cached: false,
        })
    }

    /// Remove every entry; returns how many were removed.
    pub async fn clear(&self) -> Result<usize> {
        let removed = self.backend.clear_all().await?;
        self.metrics.record_clear(removed);
        Ok(removed)
    }

    /// Entries currently held, with their age and stored size.
    pub async fn stats(&self) -> Result<CacheStats> {
        let entries: Vec<EntryStats> = self
            .backend
            .entries()
            .await?
            .into_iter()
            .map(|entry| EntryStats {
                key: entry.key,
                age_ms: u64::try_from(entry.age.as_millis()).unwrap_or(u64::MAX),
                approx_byte_size: entry.size,
            })
            .collect();

        Ok(CacheStats {
            size: entries.len(),
            entries,
            metrics: self.metrics.snapshot(),
        })
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.backend.health_check().await
    }
}
