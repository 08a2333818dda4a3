//! Enriched payload types, i.e. what the cache stores and clients receive.
//!
//! These types are written to the cache as postcard envelopes, so they stay
//! plain structs (see `crate::serialization`).

use crate::entity::CacheEntity;
use serde::{Deserialize, Serialize};

/// Upstream rating block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: u64,
}

/// Product as served by the gateway: the upstream record plus derived fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedProduct {
    pub id: u64,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: Rating,
    /// `PROD_{id}`
    pub internal_id: String,
    /// RFC 3339 timestamp of the enrichment run that produced this record.
    pub fetched_at: String,
    /// Price converted to BRL, two decimals.
    #[serde(rename = "priceInBRL")]
    pub price_in_brl: String,
    pub discount: f64,
}

/// Single-product payload: the enriched product plus simulated fields that
/// only the detail lookup carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub product: EnrichedProduct,
    pub stock: u32,
    /// `⭐` repeated `floor(rating.rate)` times.
    pub rating_stars: String,
}

/// Category as served by the gateway.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedCategory {
    pub name: String,
    pub slug: String,
    pub product_count: u32,
    pub description: String,
}

impl CacheEntity for Vec<EnrichedProduct> {
    fn kind() -> &'static str {
        "products"
    }
}

impl CacheEntity for ProductDetail {
    fn kind() -> &'static str {
        "product"
    }

    fn validate(&self) -> crate::Result<()> {
        if (1..=100).contains(&self.stock) {
            Ok(())
        } else {
            Err(crate::Error::InvalidCacheEntry(format!(
                "stock {} out of range for product {}",
                self.stock, self.product.id
            )))
        }
    }
}

impl CacheEntity for Vec<EnrichedCategory> {
    fn kind() -> &'static str {
        "categories"
    }
}
