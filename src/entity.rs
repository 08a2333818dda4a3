//! Trait implemented by every payload the catalog cache stores.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A payload that can live in the cache.
///
/// Unlike a keyed entity, a catalog payload does not know its own key: keys
/// are derived from the query that produced the payload (see
/// [`crate::key::CacheKey`]). `kind()` only labels the payload in logs and
/// metrics.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use catalog_gateway::CacheEntity;
///
/// #[derive(Clone, Serialize, Deserialize)]
/// pub struct Banner {
///     pub text: String,
/// }
///
/// impl CacheEntity for Banner {
///     fn kind() -> &'static str {
///         "banner"
///     }
/// }
/// ```
pub trait CacheEntity: Send + Sync + Serialize + for<'de> Deserialize<'de> + Clone {
    /// Short label for logs, e.g. `"products"`.
    fn kind() -> &'static str;

    /// Serialize into a versioned postcard envelope.
    ///
    /// See `crate::serialization` for the format.
    fn serialize_for_cache(&self) -> Result<Vec<u8>> {
        crate::serialization::serialize_for_cache(self)
    }

    /// Deserialize from a versioned postcard envelope.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidCacheEntry`: bad magic
    /// - `Error::VersionMismatch`: schema version changed
    /// - `Error::DeserializationError`: corrupted payload
    fn deserialize_from_cache(bytes: &[u8]) -> Result<Self> {
        crate::serialization::deserialize_from_cache(bytes)
    }

    /// Optional: validate the payload after it is read back from cache.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
    struct Banner {
        text: String,
    }

    impl CacheEntity for Banner {
        fn kind() -> &'static str {
            "banner"
        }
    }

    #[test]
    fn test_serialize_deserialize() {
        let banner = Banner {
            text: "Promoção".to_string(),
        };

        let bytes = banner.serialize_for_cache().unwrap();
        let back = Banner::deserialize_from_cache(&bytes).unwrap();

        assert_eq!(back, banner);
        assert_eq!(Banner::kind(), "banner");
        assert!(back.validate().is_ok());
    }
}
