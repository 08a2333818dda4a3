//! In-memory cache backend (default, thread-safe, async).
//!
//! Uses DashMap for sharded concurrent point access, plus a read/write gate
//! that only `clear_all` takes exclusively. TTL expiry is checked on read.

use super::{CacheBackend, EntrySnapshot};
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// In-memory cache entry with its insertion time.
struct CacheEntry {
    data: Vec<u8>,
    inserted_at: Instant,
    ttl: Option<Duration>,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        CacheEntry {
            data,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    /// Servable iff `age < ttl`.
    fn is_expired(&self, now: Instant) -> bool {
        self.ttl.is_some_and(|ttl| self.age(now) >= ttl)
    }
}

/// Thread-safe async in-memory cache backend.
///
/// Point operations (`get`, `set`, `delete`) run concurrently on DashMap
/// shards under a shared gate. `clear_all` takes the gate exclusively, so no
/// reader can observe a half-cleared map.
///
/// Time comes from `tokio::time::Instant`; under a paused test runtime,
/// `tokio::time::advance` moves entries towards expiry.
///
/// # Example
///
/// ```no_run
/// use catalog_gateway::backend::{CacheBackend, InMemoryBackend};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     backend.set("categories", b"[]".to_vec(), Some(Duration::from_secs(300))).await?;
///     assert!(backend.get("categories").await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, CacheEntry>>,
    gate: Arc<RwLock<()>>,
}

impl InMemoryBackend {
    /// Create a new in-memory cache backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
            gate: Arc::new(RwLock::new(())),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let _gate = self.gate.read().await;
        let now = Instant::now();

        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired(now) {
                debug!("✓ InMemory GET {} -> HIT", key);
                return Ok(Some(entry.data.clone()));
            }
        }

        // Lazy eviction; a concurrent fresh `set` of the same key survives.
        if self
            .store
            .remove_if(key, |_, entry| entry.is_expired(now))
            .is_some()
        {
            debug!("✓ InMemory GET {} -> EXPIRED (evicted)", key);
        } else {
            debug!("✓ InMemory GET {} -> MISS", key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let _gate = self.gate.read().await;
        self.store
            .insert(key.to_string(), CacheEntry::new(value, ttl));

        if let Some(d) = ttl {
            debug!("✓ InMemory SET {} (TTL: {:?})", key, d);
        } else {
            debug!("✓ InMemory SET {}", key);
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let _gate = self.gate.read().await;
        self.store.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    async fn delete_if_unchanged(&self, key: &str, expected: &[u8]) -> Result<bool> {
        let _gate = self.gate.read().await;
        let removed = self
            .store
            .remove_if(key, |_, entry| entry.data == expected)
            .is_some();
        if removed {
            debug!("✓ InMemory DELETE {} (unchanged)", key);
        } else {
            debug!("✓ InMemory DELETE {} skipped, entry was replaced", key);
        }
        Ok(removed)
    }

    async fn clear_all(&self) -> Result<usize> {
        let _gate = self.gate.write().await;
        let removed = self.store.len();
        self.store.clear();
        warn!("⚠ InMemory CLEAR_ALL executed - {} entries removed", removed);
        Ok(removed)
    }

    async fn entries(&self) -> Result<Vec<EntrySnapshot>> {
        let _gate = self.gate.read().await;
        let now = Instant::now();

        let mut snapshot: Vec<EntrySnapshot> = self
            .store
            .iter()
            .map(|entry| EntrySnapshot {
                key: entry.key().clone(),
                age: entry.value().age(now),
                size: entry.value().data.len(),
            })
            .collect();
        snapshot.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(snapshot)
    }

    async fn len(&self) -> Result<usize> {
        let _gate = self.gate.read().await;
        Ok(self.store.len())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let _gate = self.gate.read().await;
        let now = Instant::now();
        Ok(self
            .store
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now)))
    }
}
