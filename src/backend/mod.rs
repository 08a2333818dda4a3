//! Cache backend implementations.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;

pub mod inmemory;

pub use inmemory::InMemoryBackend;

/// Diagnostic view of one stored entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub key: String,
    /// Time since the entry was (re)inserted.
    pub age: Duration,
    /// Length of the stored bytes.
    pub size: usize,
}

/// Trait for cache backend implementations.
///
/// Backends store opaque bytes; typing, envelopes and the TTL policy live in
/// [`crate::store::CacheStore`].
///
/// All methods take `&self`: implementations use interior mutability so a
/// single backend can be shared by every request handler. Returned futures
/// are `Send` so generic axum handlers built on top stay spawnable.
pub trait CacheBackend: Send + Sync + Clone + 'static {
    /// Retrieve a live value.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - entry present and younger than its TTL
    /// - `Ok(None)` - never inserted, or expired
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Upsert a value. Re-inserting a key replaces both content and insertion
    /// time. `ttl: None` keeps the entry until it is deleted or cleared.
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove a value.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Remove `key` only if it still holds exactly `expected`; returns whether
    /// it was removed. A value written concurrently under the same key stays.
    ///
    /// The default is a non-atomic get-then-delete.
    fn delete_if_unchanged(
        &self,
        key: &str,
        expected: &[u8],
    ) -> impl Future<Output = Result<bool>> + Send {
        async move {
            match self.get(key).await? {
                Some(current) if current == expected => {
                    self.delete(key).await?;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    /// Remove every entry and report how many were removed.
    ///
    /// Must be atomic with respect to concurrent `get`/`set`: a reader sees
    /// either the whole pre-clear state or the empty post-clear state.
    fn clear_all(&self) -> impl Future<Output = Result<usize>> + Send;

    /// Snapshot of the stored entries for diagnostics.
    fn entries(&self) -> impl Future<Output = Result<Vec<EntrySnapshot>>> + Send;

    /// Number of physically stored entries.
    fn len(&self) -> impl Future<Output = Result<usize>> + Send {
        async move { Ok(self.entries().await?.len()) }
    }

    /// Check if key holds a live value.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send {
        async move { Ok(self.get(key).await?.is_some()) }
    }

    /// Health check - verify backend is accessible.
    fn health_check(&self) -> impl Future<Output = Result<bool>> + Send {
        async { Ok(true) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_backend_exists_default() {
        let backend = InMemoryBackend::new();
        backend
            .set("key", vec![1, 2, 3], None)
            .await
            .expect("Failed to set key");
        assert!(backend.exists("key").await.expect("Failed to check exists"));
        assert!(!backend
            .exists("nonexistent")
            .await
            .expect("Failed to check exists"));
        assert!(backend.health_check().await.expect("health"));
    }
}
