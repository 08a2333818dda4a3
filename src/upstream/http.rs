//! HTTP implementation of [`UpstreamCatalog`] on top of `reqwest`.

use super::{RawProduct, UpstreamCatalog};
use crate::error::{Error, Result};
use crate::key::SortOrder;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client for a fakestore-compatible catalog API.
///
/// Endpoints used:
///
/// | Operation | Request |
/// |---|---|
/// | `products` | `GET /products?limit={n}&sort={asc\|desc}` |
/// | `product` | `GET /products/{id}` |
/// | `categories` | `GET /products/categories` |
/// | `products_in_category` | `GET /products/category/{name}` |
///
/// Every request is bounded by the client timeout. The upstream answers an
/// unknown product id with either 404 or an empty body; both are `NotFound`.
/// For the list endpoints an empty or `null` body is an empty list.
#[derive(Clone, Debug)]
pub struct HttpCatalog {
    client: Client,
    base_url: Url,
}

impl HttpCatalog {
    /// # Errors
    /// `Error::ConfigError` if `base_url` is not an absolute http(s) URL or the
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::ConfigError(format!("invalid upstream URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::ConfigError(format!(
                "upstream URL must be http(s): {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("catalog-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ConfigError(format!("cannot build HTTP client: {}", e)))?;

        Ok(HttpCatalog { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::ConfigError(format!("cannot extend URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `segments` with `query`, decode the JSON body. An empty or `null`
    /// body is `Ok(None)`.
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = self.endpoint(segments)?;
        debug!("» Upstream GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!("Upstream GET {} failed: {}", url, e);
                Error::from(e)
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            error!("Upstream GET {} answered {}", url, status);
            return Err(Error::UpstreamUnavailable(format!(
                "upstream answered {} for {}",
                status,
                url.path()
            )));
        }

        let body = response.text().await.map_err(Error::from)?;
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            debug!("Upstream GET {} returned an empty body", url);
            return Ok(None);
        }

        serde_json::from_str(trimmed).map(Some).map_err(|e| {
            error!("Upstream GET {} returned an undecodable body: {}", url, e);
            Error::UpstreamUnavailable(format!("invalid payload from {}: {}", url.path(), e))
        })
    }
}

impl UpstreamCatalog for HttpCatalog {
    async fn products(&self, limit: u32, sort: SortOrder) -> Result<Vec<RawProduct>> {
        let products: Option<Vec<RawProduct>> = self
            .fetch_json(
                &["products"],
                &[("limit", limit.to_string()), ("sort", sort.to_string())],
            )
            .await?;
        Ok(products.unwrap_or_default())
    }

    async fn product(&self, id: u64) -> Result<RawProduct> {
        self.fetch_json(&["products", &id.to_string()], &[])
            .await?
            .ok_or_else(|| Error::NotFound(format!("product {}", id)))
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let categories: Option<Vec<String>> =
            self.fetch_json(&["products", "categories"], &[]).await?;
        Ok(categories.unwrap_or_default())
    }

    async fn products_in_category(&self, category: &str) -> Result<Vec<RawProduct>> {
        let products: Option<Vec<RawProduct>> = self
            .fetch_json(&["products", "category", category], &[])
            .await?;
        Ok(products.unwrap_or_default())
    }
}
