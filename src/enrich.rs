//! Enrichment pipeline: raw upstream records → served payloads.
//!
//! Deterministic rules (identifier, BRL price, discount) are plain functions.
//! The simulated fields (`stock`, `productCount`) draw from an injected RNG;
//! once written into a cache entry they stay stable until that entry expires,
//! and the next upstream fetch draws new values.

use crate::config::PricingConfig;
use crate::model::{EnrichedCategory, EnrichedProduct, ProductDetail};
use crate::upstream::RawProduct;
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use std::ops::RangeInclusive;

/// Range of the simulated stock on product detail.
pub const STOCK_RANGE: RangeInclusive<u32> = 1..=100;

/// Range of the simulated product count on categories.
pub const PRODUCT_COUNT_RANGE: RangeInclusive<u32> = 5..=54;

const RATING_GLYPH: &str = "⭐";

/// Ratings are on a five-point scale; anything above renders as full.
pub const MAX_RATING_STARS: usize = 5;

/// `PROD_{id}`
pub fn internal_id(upstream_id: u64) -> String {
    format!("PROD_{}", upstream_id)
}

/// `price × rate`, rounded half away from zero to two decimals.
pub fn price_in_brl(price: f64, conversion_rate: f64) -> String {
    let cents = (price * conversion_rate * 100.0).round();
    format!("{:.2}", cents / 100.0)
}

/// Flat discount for prices strictly above the threshold.
pub fn discount(price: f64, pricing: &PricingConfig) -> f64 {
    if price > pricing.discount_threshold {
        pricing.discount_rate
    } else {
        0.0
    }
}

/// One glyph per whole rating point, at most [`MAX_RATING_STARS`].
pub fn rating_stars(rate: f64) -> String {
    if !rate.is_finite() || rate < 1.0 {
        return String::new();
    }
    let stars = rate.floor().min(MAX_RATING_STARS as f64) as usize;
    RATING_GLYPH.repeat(stars)
}

/// Lowercase, whitespace runs collapsed into single hyphens.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Timestamp recorded once per enrichment run.
pub fn enrichment_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Applies the enrichment rules with a fixed pricing configuration.
#[derive(Clone, Debug, Default)]
pub struct Enricher {
    pricing: PricingConfig,
}

impl Enricher {
    pub fn new(pricing: PricingConfig) -> Self {
        Enricher { pricing }
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    /// Enrich one record with an explicit `fetched_at`.
    pub fn product(&self, raw: RawProduct, fetched_at: &str) -> EnrichedProduct {
        EnrichedProduct {
            internal_id: internal_id(raw.id),
            fetched_at: fetched_at.to_string(),
            price_in_brl: price_in_brl(raw.price, self.pricing.conversion_rate),
            discount: discount(raw.price, &self.pricing),
            id: raw.id,
            title: raw.title,
            price: raw.price,
            description: raw.description,
            category: raw.category,
            image: raw.image,
            rating: raw.rating,
        }
    }

    /// Enrich a listing; every record shares one `fetched_at`.
    pub fn products(&self, raws: Vec<RawProduct>) -> Vec<EnrichedProduct> {
        let fetched_at = enrichment_timestamp();
        raws.into_iter()
            .map(|raw| self.product(raw, &fetched_at))
            .collect()
    }

    /// Single-product enrichment: list rules plus simulated stock and the
    /// rating decoration.
    pub fn product_detail(&self, raw: RawProduct) -> ProductDetail {
        self.product_detail_with(raw, &enrichment_timestamp(), &mut rand::rng())
    }

    pub fn product_detail_with<R: Rng + ?Sized>(
        &self,
        raw: RawProduct,
        fetched_at: &str,
        rng: &mut R,
    ) -> ProductDetail {
        let rating_stars = rating_stars(raw.rating.rate);
        ProductDetail {
            product: self.product(raw, fetched_at),
            stock: rng.random_range(STOCK_RANGE),
            rating_stars,
        }
    }

    /// Category listing enrichment.
    pub fn categories(&self, names: Vec<String>) -> Vec<EnrichedCategory> {
        self.categories_with(names, &mut rand::rng())
    }

    pub fn categories_with<R: Rng + ?Sized>(
        &self,
        names: Vec<String>,
        rng: &mut R,
    ) -> Vec<EnrichedCategory> {
        names
            .into_iter()
            .map(|name| EnrichedCategory {
                slug: slugify(&name),
                product_count: rng.random_range(PRODUCT_COUNT_RANGE),
                description: format!("Produtos da categoria {}", name),
                name,
            })
            .collect()
    }
}
