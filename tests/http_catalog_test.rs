//! HttpCatalog against a mock upstream.

use catalog_gateway::backend::InMemoryBackend;
use catalog_gateway::service::{CATEGORY_NOT_FOUND, LISTING_NOT_FOUND};
use catalog_gateway::upstream::{HttpCatalog, UpstreamCatalog};
use catalog_gateway::{
    CacheStore, CatalogService, CategoryQuery, Enricher, Error, Principal, Role, SortOrder,
};
use std::sync::Arc;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn product_json(id: u64, price: f64, category: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Product {}", id),
        "price": price,
        "description": "A product",
        "category": category,
        "image": format!("https://img.example/{}.jpg", id),
        "rating": { "rate": 4.1, "count": 120 }
    })
}

async fn catalog(server: &MockServer) -> HttpCatalog {
    HttpCatalog::new(&server.uri(), Duration::from_secs(2)).expect("Failed to build client")
}

#[tokio::test]
async fn test_products_sends_limit_and_sort() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("limit", "2"))
        .and(query_param("sort", "asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            product_json(1, 109.95, "men's clothing"),
            product_json(2, 22.3, "men's clothing"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let products = catalog(&server)
        .await
        .products(2, SortOrder::Asc)
        .await
        .expect("products");

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id, 1);
    assert_eq!(products[1].price, 22.3);
    assert_eq!(products[0].rating.count, 120);
}

#[tokio::test]
async fn test_product_404_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = catalog(&server).await.product(999).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_product_empty_body_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/77"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/78"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let catalog = catalog(&server).await;
    assert!(matches!(catalog.product(77).await, Err(Error::NotFound(_))));
    assert!(matches!(catalog.product(78).await, Err(Error::NotFound(_))));
}

fn service(catalog: HttpCatalog) -> CatalogService<InMemoryBackend, HttpCatalog> {
    CatalogService::new(
        Arc::new(CacheStore::new(InMemoryBackend::new(), Duration::from_secs(300))),
        Arc::new(catalog),
        Enricher::default(),
        Duration::from_secs(2),
    )
}

#[tokio::test]
async fn test_empty_list_body_is_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/category/toys"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let catalog = catalog(&server).await;
    assert!(catalog.categories().await.expect("categories").is_empty());
    assert!(catalog
        .products_in_category("toys")
        .await
        .expect("category products")
        .is_empty());
}

#[tokio::test]
async fn test_listing_not_found_message_hides_upstream_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/category/toys"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/categories"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let service = service(catalog(&server).await);
    let user = Principal::new("user-1", Role::User);

    match service
        .products_by_category(&user, &CategoryQuery::from_raw("toys", None, None))
        .await
    {
        Err(Error::NotFound(msg)) => assert_eq!(msg, CATEGORY_NOT_FOUND),
        other => panic!("expected NotFound, got {:?}", other),
    }
    match service.list_categories(&user).await {
        Err(Error::NotFound(msg)) => assert_eq!(msg, LISTING_NOT_FOUND),
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert_eq!(service.store().stats().await.unwrap().size, 0);
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/categories"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = catalog(&server).await.categories().await;
    assert!(matches!(result, Err(Error::UpstreamUnavailable(_))));
}

#[tokio::test]
async fn test_undecodable_body_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = catalog(&server).await.categories().await;
    assert!(matches!(result, Err(Error::UpstreamUnavailable(_))));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/categories"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!(["electronics"]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let catalog = HttpCatalog::new(&server.uri(), Duration::from_millis(200)).unwrap();
    match catalog.categories().await {
        Err(Error::UpstreamUnavailable(msg)) => assert!(msg.contains("timed out"), "{}", msg),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_category_name_is_path_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/products/category/men('|%27)s(%20| )clothing$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json(
            2,
            22.3,
            "men's clothing"
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let products = catalog(&server)
        .await
        .products_in_category("men's clothing")
        .await
        .expect("category products");

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].category, "men's clothing");
}

#[tokio::test]
async fn test_unreachable_upstream_is_unavailable() {
    // Nothing listens on port 9 (discard) in the test environment.
    let catalog = HttpCatalog::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    assert!(matches!(
        catalog.categories().await,
        Err(Error::UpstreamUnavailable(_))
    ));
}
