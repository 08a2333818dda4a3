//! # catalog-gateway
//!
//! An authenticated API gateway in front of a third-party product catalog,
//! with a TTL cache of enriched catalog data.
//!
//! ## Features
//!
//! - **Cache-first reads:** product listings, product detail, categories and
//!   per-category listings are served from a TTL cache and only fetched
//!   upstream on a miss
//! - **Enrichment:** BRL price, discount, internal ids and simulated stock are
//!   derived once per upstream fetch and cached with the payload
//! - **Bearer auth:** HS256 JWTs carrying a `user` or `admin` role; cache
//!   administration is admin-only
//! - **Pluggable seams:** [`CacheBackend`] for storage, [`UpstreamCatalog`]
//!   for the catalog source, [`Authenticator`] for credentials
//!
//! ## Quick Start
//!
//! ```
//! use catalog_gateway::{
//!     backend::InMemoryBackend, upstream::InMemoryCatalog, Authenticator, CacheStore,
//!     CatalogService, Enricher, GatewayConfig, JwtAuthenticator, ListProductsQuery, Role,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::default();
//!
//!     let store = Arc::new(CacheStore::new(InMemoryBackend::new(), config.cache_ttl));
//!     let catalog = CatalogService::new(
//!         store,
//!         Arc::new(InMemoryCatalog::with_fixture()),
//!         Enricher::new(config.pricing.clone()),
//!         config.upstream_timeout,
//!     );
//!
//!     let auth = JwtAuthenticator::from_config(&config);
//!     let principal = auth.validate(&auth.issue("alice", Role::User)?)?;
//!
//!     let query = ListProductsQuery::from_raw(Some("2"), None, None);
//!     let first = catalog.list_products(&principal, &query).await?;
//!     let second = catalog.list_products(&principal, &query).await?;
//!
//!     assert!(!first.cached);
//!     assert!(second.cached);
//!     assert_eq!(first.data, second.data);
//!     Ok(())
//! }
//! ```
//!
//! Serving it over HTTP is a matter of wrapping the service in an
//! [`http::AppState`] and handing [`http::router`] to `axum::serve`; see
//! `src/main.rs`.

#[macro_use]
extern crate log;

pub mod admin;
pub mod auth;
pub mod backend;
pub mod config;
pub mod enrich;
pub mod entity;
pub mod error;
pub mod http;
pub mod key;
pub mod model;
pub mod observability;
pub mod serialization;
pub mod service;
pub mod store;
pub mod upstream;

// Re-exports for convenience
pub use admin::AdminService;
pub use auth::{Authenticator, JwtAuthenticator, Principal, Role};
pub use backend::CacheBackend;
pub use config::{GatewayConfig, PricingConfig};
pub use enrich::Enricher;
pub use entity::CacheEntity;
pub use error::{Error, Result};
pub use key::{CacheKey, SortOrder};
pub use service::{CatalogService, CategoryQuery, ListProductsQuery};
pub use store::{CacheStats, CacheStore, Cached};
pub use upstream::UpstreamCatalog;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
