//! Cache key derivation.
//!
//! A [`CacheKey`] is built from the normalised parameters of a catalog query.
//! Normalisation happens before the key is formatted so that logically
//! identical queries (`?limit=05&sort=DESC` and `?limit=5`) share one entry.

use std::fmt;

/// Default page size when `limit` is absent or unusable.
pub const DEFAULT_LIMIT: u32 = 10;

/// Price ordering requested by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `asc` in any case selects ascending order; anything else is descending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a `limit` query value. Absent, zero or non-numeric values fall back
/// to [`DEFAULT_LIMIT`].
pub fn normalize_limit(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_LIMIT)
}

/// Normalise the optional `category` filter of the product list.
///
/// The filter is a case-insensitive substring match, so it is lowercased.
/// Empty filters and the literal `all` mean "no filter" and fold into the
/// unfiltered key.
pub fn normalize_category_filter(raw: Option<&str>) -> Option<String> {
    let trimmed = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let lowered = trimmed.to_lowercase();
    if lowered == "all" {
        None
    } else {
        Some(lowered)
    }
}

/// Deterministic key of a cacheable catalog query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `products_{limit}_{sort}_{category|all}`
    Products {
        limit: u32,
        sort: SortOrder,
        category: Option<String>,
    },
    /// `product_{id}`
    Product(u64),
    /// `category_{name}_{limit}_{sort}`
    Category {
        name: String,
        limit: u32,
        sort: SortOrder,
    },
    /// `categories`
    Categories,
}

impl CacheKey {
    /// Key family, used as a label in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheKey::Products { .. } => "products",
            CacheKey::Product(_) => "product",
            CacheKey::Category { .. } => "category",
            CacheKey::Categories => "categories",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Products {
                limit,
                sort,
                category,
            } => write!(
                f,
                "products_{}_{}_{}",
                limit,
                sort,
                category.as_deref().unwrap_or("all")
            ),
            CacheKey::Product(id) => write!(f, "product_{}", id),
            CacheKey::Category { name, limit, sort } => {
                write!(f, "category_{}_{}_{}", name, limit, sort)
            }
            CacheKey::Categories => f.write_str("categories"),
        }
    }
}
