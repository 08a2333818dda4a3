//! Upstream catalog abstraction.
//!
//! The [`UpstreamCatalog`] trait decouples the gateway from the third-party
//! catalog API. [`HttpCatalog`] talks to the real service over HTTP;
//! [`InMemoryCatalog`] serves fixtures for tests and benches.
//!
//! # Error contract
//!
//! Implementations return:
//! - `Error::NotFound` when the upstream reports the resource as missing
//! - `Error::UpstreamUnavailable` for transport failures, timeouts, non-success
//!   statuses and undecodable payloads
//!
//! No implementation retries; the caller surfaces the first failure.

use crate::error::Result;
use crate::key::SortOrder;
use crate::model::Rating;
use serde::{Deserialize, Serialize};
use std::future::Future;

pub mod http;
pub mod memory;

pub use http::HttpCatalog;
pub use memory::InMemoryCatalog;

/// Product record as returned by the upstream API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawProduct {
    pub id: u64,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rating: Rating,
}

/// Source of raw catalog data.
///
/// Returned futures are `Send` so services generic over the catalog can run
/// inside axum handlers.
pub trait UpstreamCatalog: Send + Sync + 'static {
    /// Product listing, as ordered and truncated by the upstream.
    fn products(
        &self,
        limit: u32,
        sort: SortOrder,
    ) -> impl Future<Output = Result<Vec<RawProduct>>> + Send;

    /// One product.
    ///
    /// # Errors
    /// `Error::NotFound` if the upstream has no product with this id.
    fn product(&self, id: u64) -> impl Future<Output = Result<RawProduct>> + Send;

    /// Category names.
    fn categories(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Every product of one category, in upstream order.
    fn products_in_category(
        &self,
        category: &str,
    ) -> impl Future<Output = Result<Vec<RawProduct>>> + Send;
}
