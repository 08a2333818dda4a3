//! HTTP surface: axum router, bearer extractor and JSON envelopes.
//!
//! | Route | Auth |
//! |---|---|
//! | `GET /health`, `GET /api-docs` | none |
//! | `GET /auth/verify` | any valid token |
//! | `GET /products`, `GET /products/{id}`, `GET /categories`, `GET /products/category/{category}` | any valid token |
//! | `DELETE /admin/cache`, `GET /admin/cache/stats` (also under `/cache`) | admin |

use crate::admin::AdminService;
use crate::auth::Authenticator;
use crate::backend::CacheBackend;
use crate::service::CatalogService;
use crate::upstream::UpstreamCatalog;
use axum::extract::FromRef;
use axum::routing::{delete, get};
use axum::Router;
use std::sync::Arc;

pub mod error;
pub mod extract;
pub mod handlers;

pub use error::ApiError;
pub use extract::{AuthUser, PathParam, QueryParams};

/// Shared state handed to every handler.
pub struct AppState<B: CacheBackend, U: UpstreamCatalog> {
    pub catalog: CatalogService<B, U>,
    pub admin: AdminService<B>,
    pub auth: Arc<dyn Authenticator>,
    /// Shown by the health endpoint, e.g. the upstream base URL.
    pub upstream_label: Arc<str>,
}

impl<B: CacheBackend, U: UpstreamCatalog> AppState<B, U> {
    pub fn new(
        catalog: CatalogService<B, U>,
        auth: Arc<dyn Authenticator>,
        upstream_label: impl Into<Arc<str>>,
    ) -> Self {
        AppState {
            admin: AdminService::new(Arc::clone(catalog.store())),
            catalog,
            auth,
            upstream_label: upstream_label.into(),
        }
    }
}

impl<B: CacheBackend, U: UpstreamCatalog> Clone for AppState<B, U> {
    fn clone(&self) -> Self {
        AppState {
            catalog: self.catalog.clone(),
            admin: self.admin.clone(),
            auth: Arc::clone(&self.auth),
            upstream_label: Arc::clone(&self.upstream_label),
        }
    }
}

impl<B: CacheBackend, U: UpstreamCatalog> FromRef<AppState<B, U>> for Arc<dyn Authenticator> {
    fn from_ref(state: &AppState<B, U>) -> Self {
        Arc::clone(&state.auth)
    }
}

/// Build the gateway router.
pub fn router<B: CacheBackend, U: UpstreamCatalog>(state: AppState<B, U>) -> Router {
    let admin = Router::new()
        .route("/cache", delete(handlers::clear_cache::<B, U>))
        .route("/cache/stats", get(handlers::cache_stats::<B, U>));

    Router::new()
        .route("/health", get(handlers::health::<B, U>))
        .route("/api-docs", get(handlers::api_docs))
        .route("/auth/verify", get(handlers::verify_token))
        .route("/products", get(handlers::list_products::<B, U>))
        .route("/products/{id}", get(handlers::get_product::<B, U>))
        .route(
            "/products/category/{category}",
            get(handlers::products_by_category::<B, U>),
        )
        .route("/categories", get(handlers::list_categories::<B, U>))
        .nest("/admin", admin.clone())
        .merge(admin)
        .fallback(handlers::not_found)
        .with_state(state)
}
