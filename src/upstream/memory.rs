//! In-memory catalog for tests and benches.

use super::{RawProduct, UpstreamCatalog};
use crate::error::{Error, Result};
use crate::key::SortOrder;
use crate::model::Rating;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fixture-backed [`UpstreamCatalog`].
///
/// Clones share the call counter and the failure switch, so a test can keep a
/// handle while the service owns another.
///
/// # Example
///
/// ```
/// use catalog_gateway::upstream::{InMemoryCatalog, UpstreamCatalog};
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// let catalog = InMemoryCatalog::with_fixture();
/// let product = rt.block_on(catalog.product(1)).unwrap();
/// assert_eq!(product.id, 1);
/// assert_eq!(catalog.calls(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    products: Arc<Vec<RawProduct>>,
    latency: Option<Duration>,
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<RawProduct>) -> Self {
        InMemoryCatalog {
            products: Arc::new(products),
            ..Default::default()
        }
    }

    /// Six products across four categories. Product 1 is priced above the
    /// discount threshold, product 2 below it.
    pub fn with_fixture() -> Self {
        Self::new(fixture_products())
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every subsequent call fail with `UpstreamUnavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of calls served so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    async fn enter(&self, operation: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::UpstreamUnavailable(format!(
                "in-memory catalog is failing ({})",
                operation
            )));
        }
        Ok(())
    }
}

impl UpstreamCatalog for InMemoryCatalog {
    async fn products(&self, limit: u32, sort: SortOrder) -> Result<Vec<RawProduct>> {
        self.enter("products").await?;

        let mut products: Vec<RawProduct> = self.products.to_vec();
        match sort {
            SortOrder::Asc => products.sort_by_key(|p| p.id),
            SortOrder::Desc => products.sort_by_key(|p| std::cmp::Reverse(p.id)),
        }
        products.truncate(limit as usize);
        Ok(products)
    }

    async fn product(&self, id: u64) -> Result<RawProduct> {
        self.enter("product").await?;

        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("product {}", id)))
    }

    async fn categories(&self) -> Result<Vec<String>> {
        self.enter("categories").await?;

        let mut names: Vec<String> = Vec::new();
        for product in self.products.iter() {
            if !names.contains(&product.category) {
                names.push(product.category.clone());
            }
        }
        Ok(names)
    }

    async fn products_in_category(&self, category: &str) -> Result<Vec<RawProduct>> {
        self.enter("products_in_category").await?;

        Ok(self
            .products
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }
}

fn product(id: u64, title: &str, price: f64, category: &str, rate: f64, count: u64) -> RawProduct {
    RawProduct {
        id,
        title: title.to_string(),
        price,
        description: format!("{} description", title),
        category: category.to_string(),
        image: format!("https://fakestoreapi.com/img/{}.jpg", id),
        rating: Rating { rate, count },
    }
}

fn fixture_products() -> Vec<RawProduct> {
    vec![
        product(1, "Fjallraven Backpack", 109.95, "men's clothing", 3.9, 120),
        product(2, "Casual Premium Slim Fit T-Shirt", 22.3, "men's clothing", 4.1, 259),
        product(3, "Dragon Station Chain Bracelet", 695.0, "jewelery", 4.6, 400),
        product(4, "Solid Gold Petite Micropave", 9.99, "jewelery", 3.9, 70),
        product(5, "WD 2TB External Hard Drive", 64.0, "electronics", 3.3, 203),
        product(6, "Rain Jacket Women Windbreaker", 39.99, "women's clothing", 3.8, 679),
    ]
}
