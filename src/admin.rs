//! Admin control surface: role-gated cache clear and stats.

use crate::auth::Principal;
use crate::backend::CacheBackend;
use crate::error::Result;
use crate::store::{CacheStats, CacheStore};
use std::sync::Arc;

pub const CLEAR_DENIED: &str = "Acesso negado. Apenas administradores podem limpar o cache.";
pub const STATS_DENIED: &str =
    "Acesso negado. Apenas administradores podem ver estatísticas do cache.";

pub struct AdminService<B: CacheBackend> {
    store: Arc<CacheStore<B>>,
}

impl<B: CacheBackend> Clone for AdminService<B> {
    fn clone(&self) -> Self {
        AdminService {
            store: Arc::clone(&self.store),
        }
    }
}

impl<B: CacheBackend> AdminService<B> {
    pub fn new(store: Arc<CacheStore<B>>) -> Self {
        AdminService { store }
    }

    /// Remove every cache entry; returns how many were removed.
    ///
    /// # Errors
    /// `Error::Forbidden` unless `principal` is an admin.
    pub async fn clear_cache(&self, principal: &Principal) -> Result<usize> {
        principal.require_admin(CLEAR_DENIED)?;

        let removed = self.store.clear().await?;
        warn!("Cache cleared by {}: {} entries removed", principal.id, removed);
        Ok(removed)
    }

    /// # Errors
    /// `Error::Forbidden` unless `principal` is an admin.
    pub async fn cache_stats(&self, principal: &Principal) -> Result<CacheStats> {
        principal.require_admin(STATS_DENIED)?;

        let stats = self.store.stats().await?;
        debug!("Cache stats for {}: {} entries", principal.id, stats.size);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::backend::InMemoryBackend;
    use crate::error::Error;
    use crate::model::EnrichedCategory;
    use std::time::Duration;

    async fn seeded() -> (AdminService<InMemoryBackend>, Arc<CacheStore<InMemoryBackend>>) {
        let store = Arc::new(CacheStore::new(
            InMemoryBackend::new(),
            Duration::from_secs(300),
        ));
        let categories = vec![EnrichedCategory {
            name: "electronics".to_string(),
            slug: "electronics".to_string(),
            product_count: 12,
            description: "Produtos da categoria electronics".to_string(),
        }];
        store.put("categories", &categories).await.unwrap();
        (AdminService::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn test_user_cannot_clear_or_read_stats() {
        let (admin, store) = seeded().await;
        let user = Principal::new("u1", Role::User);

        match admin.clear_cache(&user).await {
            Err(Error::Forbidden(msg)) => assert_eq!(msg, CLEAR_DENIED),
            other => panic!("expected Forbidden, got {:?}", other),
        }
        match admin.cache_stats(&user).await {
            Err(Error::Forbidden(msg)) => assert_eq!(msg, STATS_DENIED),
            other => panic!("expected Forbidden, got {:?}", other),
        }
        assert_eq!(store.stats().await.unwrap().size, 1);
    }

    #[tokio::test]
    async fn test_admin_stats_then_clear() {
        let (admin, _store) = seeded().await;
        let root = Principal::new("root", Role::Admin);

        let stats = admin.cache_stats(&root).await.unwrap();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.entries[0].key, "categories");

        assert_eq!(admin.clear_cache(&root).await.unwrap(), 1);
        assert_eq!(admin.cache_stats(&root).await.unwrap().size, 0);
    }
}
