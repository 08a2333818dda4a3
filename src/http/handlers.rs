//! Route handlers and response envelopes.

use super::error::{ApiError, ROUTE_NOT_FOUND};
use super::extract::{AuthUser, PathParam, QueryParams};
use super::AppState;
use crate::auth::Principal;
use crate::backend::CacheBackend;
use crate::model::{EnrichedCategory, EnrichedProduct};
use crate::observability::MetricsSnapshot;
use crate::service::{CategoryQuery, ListProductsQuery};
use crate::store::EntryStats;
use crate::upstream::UpstreamCatalog;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct ProductsParams {
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryParams {
    pub limit: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub message: String,
    pub data: Vec<EnrichedProduct>,
    pub total: usize,
    pub cached: bool,
    pub user: Principal,
}

/// Enriched product with the detail-only fields inlined.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailBody {
    #[serde(flatten)]
    pub product: EnrichedProduct,
    pub stock: u32,
    pub rating_stars: String,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub message: String,
    pub data: ProductDetailBody,
    pub cached: bool,
    pub user: Principal,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub message: String,
    pub data: Vec<EnrichedCategory>,
    pub total: usize,
    pub cached: bool,
    pub user: Principal,
}

#[derive(Debug, Serialize)]
pub struct CategoryProductsResponse {
    pub message: String,
    pub data: Vec<EnrichedProduct>,
    pub category: String,
    pub total: usize,
    pub cached: bool,
    pub user: Principal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearCacheResponse {
    pub message: String,
    pub cleared_entries: usize,
    pub user: Principal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    pub message: String,
    pub cache_size: usize,
    pub entries: Vec<EntryStats>,
    pub metrics: Option<MetricsSnapshot>,
    pub user: Principal,
}

pub async fn list_products<B: CacheBackend, U: UpstreamCatalog>(
    State(state): State<AppState<B, U>>,
    AuthUser(user): AuthUser,
    QueryParams(params): QueryParams<ProductsParams>,
) -> ApiResult<ProductsResponse> {
    let query = ListProductsQuery::from_raw(
        params.limit.as_deref(),
        params.sort.as_deref(),
        params.category.as_deref(),
    );
    let page = state.catalog.list_products(&user, &query).await?;

    Ok(Json(ProductsResponse {
        message: "Produtos obtidos com sucesso".to_string(),
        data: page.data,
        total: page.total,
        cached: page.cached,
        user,
    }))
}

pub async fn get_product<B: CacheBackend, U: UpstreamCatalog>(
    State(state): State<AppState<B, U>>,
    AuthUser(user): AuthUser,
    PathParam(id): PathParam<String>,
) -> ApiResult<ProductResponse> {
    let view = state.catalog.get_product(&user, &id).await?;

    Ok(Json(ProductResponse {
        message: "Produto obtido com sucesso".to_string(),
        data: ProductDetailBody {
            product: view.data.product,
            stock: view.data.stock,
            rating_stars: view.data.rating_stars,
        },
        cached: view.cached,
        user,
    }))
}

pub async fn list_categories<B: CacheBackend, U: UpstreamCatalog>(
    State(state): State<AppState<B, U>>,
    AuthUser(user): AuthUser,
) -> ApiResult<CategoriesResponse> {
    let list = state.catalog.list_categories(&user).await?;

    Ok(Json(CategoriesResponse {
        message: "Categorias obtidas com sucesso".to_string(),
        data: list.data,
        total: list.total,
        cached: list.cached,
        user,
    }))
}

pub async fn products_by_category<B: CacheBackend, U: UpstreamCatalog>(
    State(state): State<AppState<B, U>>,
    AuthUser(user): AuthUser,
    PathParam(category): PathParam<String>,
    QueryParams(params): QueryParams<CategoryParams>,
) -> ApiResult<CategoryProductsResponse> {
    let query = CategoryQuery::from_raw(&category, params.limit.as_deref(), params.sort.as_deref());
    let page = state.catalog.products_by_category(&user, &query).await?;

    Ok(Json(CategoryProductsResponse {
        message: format!("Produtos da categoria {} obtidos com sucesso", page.category),
        data: page.data,
        category: page.category,
        total: page.total,
        cached: page.cached,
        user,
    }))
}

pub async fn clear_cache<B: CacheBackend, U: UpstreamCatalog>(
    State(state): State<AppState<B, U>>,
    AuthUser(user): AuthUser,
) -> ApiResult<ClearCacheResponse> {
    let cleared_entries = state.admin.clear_cache(&user).await?;

    Ok(Json(ClearCacheResponse {
        message: "Cache limpo com sucesso".to_string(),
        cleared_entries,
        user,
    }))
}

pub async fn cache_stats<B: CacheBackend, U: UpstreamCatalog>(
    State(state): State<AppState<B, U>>,
    AuthUser(user): AuthUser,
) -> ApiResult<CacheStatsResponse> {
    let stats = state.admin.cache_stats(&user).await?;

    Ok(Json(CacheStatsResponse {
        message: "Estatísticas do cache".to_string(),
        cache_size: stats.size,
        entries: stats.entries,
        metrics: stats.metrics,
        user,
    }))
}

pub async fn verify_token(AuthUser(user): AuthUser) -> Json<Value> {
    Json(json!({
        "message": "Token válido",
        "user": user,
    }))
}

pub async fn health<B: CacheBackend, U: UpstreamCatalog>(
    State(state): State<AppState<B, U>>,
) -> impl IntoResponse {
    let cache_ok = match state.catalog.store().health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            error!("Cache health check failed: {}", e);
            false
        }
    };
    let status = if cache_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "gateway": "OK",
            "services": {
                "cache": if cache_ok { "OK" } else { "ERROR" },
                "catalog": &*state.upstream_label,
            },
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })),
    )
}

pub async fn api_docs() -> Json<Value> {
    Json(json!({
        "message": "API Gateway - Documentação",
        "version": crate::VERSION,
        "authentication": "Authorization: Bearer <token>",
        "endpoints": {
            "GET /health": "Estado do gateway e do cache",
            "GET /auth/verify": "Valida o token informado",
            "GET /products": "Lista produtos (limit, sort, category)",
            "GET /products/{id}": "Detalhe de um produto",
            "GET /categories": "Lista categorias",
            "GET /products/category/{category}": "Produtos de uma categoria (limit, sort)",
            "DELETE /admin/cache": "Limpa o cache (admin)",
            "GET /admin/cache/stats": "Estatísticas do cache (admin)",
        },
        "examples": {
            "products": "/products?limit=5&sort=asc",
            "filtered": "/products?category=clothing",
            "category": "/products/category/electronics?limit=3&sort=desc",
        },
    }))
}

pub async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    warn!("No route for {} {}", method, uri.path());
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": ROUTE_NOT_FOUND,
            "message": format!("A rota {} {} não existe", method, uri.path()),
        })),
    )
}
