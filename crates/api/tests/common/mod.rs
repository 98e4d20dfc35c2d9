#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use bundlewise_api::config::ServerConfig;
use bundlewise_api::router::build_app_router;
use bundlewise_api::state::AppState;
use bundlewise_commerce::mock::{MockBundleStore, MockCatalog, MockDiscountStore};
use bundlewise_engine::store::MemoryStore;
use bundlewise_engine::{AnalyticsService, AssignmentService, DiscountSynchronizer, RuleEngine};
use bundlewise_events::EventBus;
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const SHOP: &str = "acme.myshopify.com";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        reconcile_interval_secs: 0,
        reconcile_shops: Vec::new(),
    }
}

/// The application wired to in-memory stores, with handles to the doubles.
pub struct TestApp {
    pub router: Router,
    pub bundles: Arc<MockBundleStore>,
    pub discounts: Arc<MockDiscountStore>,
    pub catalog: Arc<MockCatalog>,
    pub store: Arc<MemoryStore>,
    pub event_bus: Arc<EventBus>,
}

/// Build the full application router, middleware included, over in-memory
/// remote doubles and local store.
pub fn build_test_app() -> TestApp {
    let bundles = Arc::new(MockBundleStore::new());
    let discounts = Arc::new(MockDiscountStore::new());
    let catalog = Arc::new(MockCatalog::new());
    let store = Arc::new(MemoryStore::new());
    let event_bus = Arc::new(EventBus::default());

    let synchronizer = Arc::new(DiscountSynchronizer::new(
        bundles.clone(),
        discounts.clone(),
        store.clone(),
    ));
    let rules = Arc::new(RuleEngine::new(
        store.clone(),
        catalog.clone(),
        Arc::clone(&synchronizer),
    ));
    let state = AppState {
        pool: None,
        config: Arc::new(test_config()),
        synchronizer,
        rules,
        assignments: Arc::new(AssignmentService::new(store.clone(), store.clone())),
        analytics: Arc::new(AnalyticsService::new(Arc::clone(&event_bus), store.clone())),
        event_bus: Arc::clone(&event_bus),
    };

    TestApp {
        router: build_app_router(state),
        bundles,
        discounts,
        catalog,
        store,
        event_bus,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-shop-domain", SHOP);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn patch_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Percent-encode a remote id for use as a path segment.
pub fn path_id(id: &str) -> String {
    id.replace('/', "%2F").replace(':', "%3A")
}
