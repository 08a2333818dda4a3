//! Catalog access service: the four cache-first read operations.
//!
//! Every operation derives a [`CacheKey`] from its normalised query, asks the
//! [`CacheStore`] for a live entry and only on a miss calls the upstream
//! catalog, enriches the result and stores it. Upstream calls are bounded by
//! the configured timeout.

use crate::auth::Principal;
use crate::backend::CacheBackend;
use crate::enrich::Enricher;
use crate::error::{Error, Result};
use crate::key::{normalize_category_filter, normalize_limit, CacheKey, SortOrder};
use crate::model::{EnrichedCategory, EnrichedProduct, ProductDetail};
use crate::store::CacheStore;
use crate::upstream::{RawProduct, UpstreamCatalog};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Message reported when a product lookup finds nothing.
pub const PRODUCT_NOT_FOUND: &str = "Produto não encontrado";

/// Message reported when the upstream has no such category.
pub const CATEGORY_NOT_FOUND: &str = "Categoria não encontrada";

/// Message reported when a catalog listing endpoint is missing upstream.
pub const LISTING_NOT_FOUND: &str = "Recurso não encontrado no catálogo";

/// Normalised `GET /products` query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListProductsQuery {
    pub limit: u32,
    pub sort: SortOrder,
    /// Lowercased substring filter on the product category.
    pub category: Option<String>,
}

impl ListProductsQuery {
    pub fn from_raw(limit: Option<&str>, sort: Option<&str>, category: Option<&str>) -> Self {
        ListProductsQuery {
            limit: normalize_limit(limit),
            sort: SortOrder::parse(sort),
            category: normalize_category_filter(category),
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::Products {
            limit: self.limit,
            sort: self.sort,
            category: self.category.clone(),
        }
    }
}

impl Default for ListProductsQuery {
    fn default() -> Self {
        Self::from_raw(None, None, None)
    }
}

/// Normalised `GET /products/category/{name}` query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryQuery {
    /// Upstream category name, matched exactly.
    pub name: String,
    pub limit: u32,
    pub sort: SortOrder,
}

impl CategoryQuery {
    pub fn from_raw(name: &str, limit: Option<&str>, sort: Option<&str>) -> Self {
        CategoryQuery {
            name: name.trim().to_string(),
            limit: normalize_limit(limit),
            sort: SortOrder::parse(sort),
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::Category {
            name: self.name.clone(),
            limit: self.limit,
            sort: self.sort,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductPage {
    pub data: Vec<EnrichedProduct>,
    pub total: usize,
    pub cached: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductView {
    pub data: ProductDetail,
    pub cached: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryList {
    pub data: Vec<EnrichedCategory>,
    pub total: usize,
    pub cached: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryPage {
    pub data: Vec<EnrichedProduct>,
    pub category: String,
    pub total: usize,
    pub cached: bool,
}

/// Cache-first catalog reads.
///
/// Cheap to clone: the store and the upstream client are shared.
pub struct CatalogService<B: CacheBackend, U: UpstreamCatalog> {
    store: Arc<CacheStore<B>>,
    upstream: Arc<U>,
    enricher: Enricher,
    upstream_timeout: Duration,
}

impl<B: CacheBackend, U: UpstreamCatalog> Clone for CatalogService<B, U> {
    fn clone(&self) -> Self {
        CatalogService {
            store: Arc::clone(&self.store),
            upstream: Arc::clone(&self.upstream),
            enricher: self.enricher.clone(),
            upstream_timeout: self.upstream_timeout,
        }
    }
}

impl<B: CacheBackend, U: UpstreamCatalog> CatalogService<B, U> {
    pub fn new(
        store: Arc<CacheStore<B>>,
        upstream: Arc<U>,
        enricher: Enricher,
        upstream_timeout: Duration,
    ) -> Self {
        CatalogService {
            store,
            upstream,
            enricher,
            upstream_timeout,
        }
    }

    pub fn store(&self) -> &Arc<CacheStore<B>> {
        &self.store
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    /// List products, optionally filtered by a category substring.
    ///
    /// The filter applies to the page the upstream returned for
    /// `limit`/`sort`, so `total` may be smaller than `limit`.
    pub async fn list_products(
        &self,
        principal: &Principal,
        query: &ListProductsQuery,
    ) -> Result<ProductPage> {
        debug!("{} lists products {:?}", principal.id, query);

        let key = query.cache_key();
        let result = self
            .store
            .get_or_load(&key, || async {
                let raws = self
                    .bounded("products", self.upstream.products(query.limit, query.sort))
                    .await
                    .map_err(|e| localize_not_found(e, LISTING_NOT_FOUND))?;
                let raws = match &query.category {
                    Some(filter) => filter_by_category(raws, filter),
                    None => raws,
                };
                Ok(self.enricher.products(raws))
            })
            .await?;

        Ok(ProductPage {
            total: result.value.len(),
            data: result.value,
            cached: result.cached,
        })
    }

    /// Single product with simulated stock and rating decoration.
    ///
    /// # Errors
    /// `Error::NotFound` if `id` is not a product id or the upstream has no
    /// such product. A non-numeric id never reaches the upstream.
    pub async fn get_product(&self, principal: &Principal, id: &str) -> Result<ProductView> {
        debug!("{} reads product {}", principal.id, id);

        let id: u64 = id
            .trim()
            .parse()
            .map_err(|_| Error::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

        let result = self
            .store
            .get_or_load(&CacheKey::Product(id), || async move {
                let raw = self
                    .bounded("product", self.upstream.product(id))
                    .await
                    .map_err(|e| localize_not_found(e, PRODUCT_NOT_FOUND))?;
                Ok(self.enricher.product_detail(raw))
            })
            .await?;

        Ok(ProductView {
            data: result.value,
            cached: result.cached,
        })
    }

    pub async fn list_categories(&self, principal: &Principal) -> Result<CategoryList> {
        debug!("{} lists categories", principal.id);

        let result = self
            .store
            .get_or_load(&CacheKey::Categories, || async {
                let names = self
                    .bounded("categories", self.upstream.categories())
                    .await
                    .map_err(|e| localize_not_found(e, LISTING_NOT_FOUND))?;
                Ok(self.enricher.categories(names))
            })
            .await?;

        Ok(CategoryList {
            total: result.value.len(),
            data: result.value,
            cached: result.cached,
        })
    }

    /// Products of one category ordered by price (stable for equal prices),
    /// then truncated to `limit`.
    pub async fn products_by_category(
        &self,
        principal: &Principal,
        query: &CategoryQuery,
    ) -> Result<CategoryPage> {
        debug!("{} lists category {:?}", principal.id, query);

        let key = query.cache_key();
        let result = self
            .store
            .get_or_load(&key, || async {
                let mut raws = self
                    .bounded(
                        "products_in_category",
                        self.upstream.products_in_category(&query.name),
                    )
                    .await
                    .map_err(|e| localize_not_found(e, CATEGORY_NOT_FOUND))?;
                sort_by_price(&mut raws, query.sort);
                raws.truncate(query.limit as usize);
                Ok(self.enricher.products(raws))
            })
            .await?;

        Ok(CategoryPage {
            total: result.value.len(),
            data: result.value,
            category: query.name.clone(),
            cached: result.cached,
        })
    }

    async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.upstream_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(Error::NotFound(detail))) => {
                debug!("Upstream {} reported not found: {}", operation, detail);
                Err(Error::NotFound(detail))
            }
            Ok(Err(e)) => {
                error!("Upstream {} failed: {}", operation, e);
                Err(e)
            }
            Err(elapsed) => {
                error!(
                    "Upstream {} exceeded {:?}",
                    operation, self.upstream_timeout
                );
                Err(Error::from(elapsed))
            }
        }
    }
}

/// Upstream `NotFound` details name URLs; clients get `message` instead.
fn localize_not_found(e: Error, message: &str) -> Error {
    match e {
        Error::NotFound(_) => Error::NotFound(message.to_string()),
        other => other,
    }
}

fn filter_by_category(raws: Vec<RawProduct>, filter: &str) -> Vec<RawProduct> {
    raws.into_iter()
        .filter(|p| p.category.to_lowercase().contains(filter))
        .collect()
}

fn sort_by_price(raws: &mut [RawProduct], sort: SortOrder) {
    match sort {
        SortOrder::Asc => raws.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortOrder::Desc => raws.sort_by(|a, b| b.price.total_cmp(&a.price)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::backend::InMemoryBackend;
    use crate::enrich::STOCK_RANGE;
    use crate::upstream::InMemoryCatalog;

    const TTL: Duration = Duration::from_secs(300);

    fn service(catalog: InMemoryCatalog) -> CatalogService<InMemoryBackend, InMemoryCatalog> {
        CatalogService::new(
            Arc::new(CacheStore::new(InMemoryBackend::new(), TTL)),
            Arc::new(catalog),
            Enricher::default(),
            Duration::from_secs(10),
        )
    }

    fn user() -> Principal {
        Principal::new("user-1", Role::User)
    }

    fn ids(products: &[EnrichedProduct]) -> Vec<u64> {
        products.iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn test_list_products_miss_then_hit() {
        let catalog = InMemoryCatalog::with_fixture();
        let service = service(catalog.clone());
        let query = ListProductsQuery::from_raw(Some("2"), None, None);

        let first = service.list_products(&user(), &query).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.total, 2);
        assert_eq!(ids(&first.data), vec![6, 5]);

        let second = service.list_products(&user(), &query).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.data, first.data);
        assert_eq!(catalog.calls(), 1);
    }

    #[tokio::test]
    async fn test_equivalent_queries_share_entry() {
        let catalog = InMemoryCatalog::with_fixture();
        let service = service(catalog.clone());

        service
            .list_products(&user(), &ListProductsQuery::from_raw(Some("5"), Some("desc"), None))
            .await
            .unwrap();
        let again = service
            .list_products(&user(), &ListProductsQuery::from_raw(Some("05"), None, Some("all")))
            .await
            .unwrap();

        assert!(again.cached);
        assert_eq!(catalog.calls(), 1);
    }

    #[tokio::test]
    async fn test_list_products_category_filter() {
        let service = service(InMemoryCatalog::with_fixture());
        let query = ListProductsQuery::from_raw(None, None, Some("CLOTH"));

        let page = service.list_products(&user(), &query).await.unwrap();
        assert_eq!(ids(&page.data), vec![6, 2, 1]);
        assert_eq!(page.total, 3);

        let stats = service.store().stats().await.unwrap();
        assert_eq!(stats.entries[0].key, "products_10_desc_cloth");
    }

    #[tokio::test]
    async fn test_get_product_enriched_and_stable() {
        let catalog = InMemoryCatalog::with_fixture();
        let service = service(catalog.clone());

        let first = service.get_product(&user(), "1").await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.data.product.internal_id, "PROD_1");
        assert_eq!(first.data.product.discount, 0.1);
        assert_eq!(first.data.rating_stars, "⭐⭐⭐");
        assert!(STOCK_RANGE.contains(&first.data.stock));

        let second = service.get_product(&user(), "1").await.unwrap();
        assert!(second.cached);
        assert_eq!(second.data, first.data);
        assert_eq!(catalog.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let catalog = InMemoryCatalog::with_fixture();
        let service = service(catalog.clone());

        match service.get_product(&user(), "abc").await {
            Err(Error::NotFound(msg)) => assert_eq!(msg, PRODUCT_NOT_FOUND),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert_eq!(catalog.calls(), 0);

        match service.get_product(&user(), "999").await {
            Err(Error::NotFound(msg)) => assert_eq!(msg, PRODUCT_NOT_FOUND),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert_eq!(service.store().stats().await.unwrap().size, 0);
    }

    #[tokio::test]
    async fn test_get_product_with_out_of_range_rating() {
        let raw = RawProduct {
            id: 1,
            title: "Oddly rated".to_string(),
            price: 12.0,
            description: String::new(),
            category: "electronics".to_string(),
            image: String::new(),
            rating: crate::model::Rating {
                rate: 1e19,
                count: 1,
            },
        };
        let service = service(InMemoryCatalog::new(vec![raw]));

        let view = tokio::spawn(async move { service.get_product(&user(), "1").await })
            .await
            .expect("request task panicked")
            .unwrap();
        assert_eq!(view.data.rating_stars.chars().count(), 5);
    }

    #[tokio::test]
    async fn test_list_categories() {
        let service = service(InMemoryCatalog::with_fixture());

        let list = service.list_categories(&user()).await.unwrap();
        assert_eq!(list.total, 4);
        assert_eq!(list.data[0].slug, "men's-clothing");
        assert_eq!(list.data[3].slug, "women's-clothing");

        let again = service.list_categories(&user()).await.unwrap();
        assert!(again.cached);
        assert_eq!(again.data, list.data);
    }

    #[tokio::test]
    async fn test_products_by_category_sorted_by_price() {
        let service = service(InMemoryCatalog::with_fixture());

        let asc = service
            .products_by_category(
                &user(),
                &CategoryQuery::from_raw("men's clothing", None, Some("asc")),
            )
            .await
            .unwrap();
        assert_eq!(ids(&asc.data), vec![2, 1]);
        assert_eq!(asc.category, "men's clothing");

        let top = service
            .products_by_category(
                &user(),
                &CategoryQuery::from_raw("men's clothing", Some("1"), None),
            )
            .await
            .unwrap();
        assert_eq!(ids(&top.data), vec![1]);
        assert_eq!(top.total, 1);
        assert!(!top.cached);
    }

    #[test]
    fn test_sort_by_price_is_stable() {
        let mut raws: Vec<RawProduct> = [(1, 10.0), (2, 5.0), (3, 10.0), (4, 5.0)]
            .iter()
            .map(|(id, price)| RawProduct {
                id: *id,
                title: String::new(),
                price: *price,
                description: String::new(),
                category: String::new(),
                image: String::new(),
                rating: Default::default(),
            })
            .collect();

        sort_by_price(&mut raws, SortOrder::Desc);
        assert_eq!(raws.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 3, 2, 4]);

        sort_by_price(&mut raws, SortOrder::Asc);
        assert_eq!(raws.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 4, 1, 3]);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_not_cached() {
        let catalog = InMemoryCatalog::with_fixture();
        let service = service(catalog.clone());

        catalog.set_failing(true);
        assert!(matches!(
            service.list_categories(&user()).await,
            Err(Error::UpstreamUnavailable(_))
        ));
        assert_eq!(service.store().stats().await.unwrap().size, 0);

        catalog.set_failing(false);
        let recovered = service.list_categories(&user()).await.unwrap();
        assert!(!recovered.cached);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_timeout() {
        let catalog = InMemoryCatalog::with_fixture().with_latency(Duration::from_secs(30));
        let service = service(catalog);

        match service.list_categories(&user()).await {
            Err(Error::UpstreamUnavailable(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_refetched() {
        let catalog = InMemoryCatalog::with_fixture();
        let service = service(catalog.clone());
        let query = ListProductsQuery::default();

        service.list_products(&user(), &query).await.unwrap();
        tokio::time::advance(TTL).await;

        let refreshed = service.list_products(&user(), &query).await.unwrap();
        assert!(!refreshed.cached);
        assert_eq!(catalog.calls(), 2);
    }
}
