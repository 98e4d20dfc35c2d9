//! Bundle endpoints over in-memory remote doubles.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, delete, get, patch_json, path_id, post_json, SHOP};
use serde_json::{json, Value};

fn bundle_body(name: &str, products: &[&str], percent: f64) -> Value {
    json!({
        "name": name,
        "title": format!("{name} set"),
        "discountPercent": percent,
        "status": "ACTIVE",
        "components": products
            .iter()
            .map(|p| json!({ "productId": p, "quantity": 1 }))
            .collect::<Vec<_>>(),
    })
}

async fn create(app: &common::TestApp, name: &str, products: &[&str]) -> Value {
    let response = post_json(&app.router, "/api/v1/bundles", bundle_body(name, products, 10.0)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

#[tokio::test]
async fn create_returns_bundle_with_discount() {
    let app = build_test_app();
    let data = create(&app, "pair", &["p1", "p2"]).await;

    assert_eq!(data["name"], "pair");
    assert_eq!(data["status"], "ACTIVE");
    assert!(data["id"].as_str().unwrap().starts_with("gid://"));
    assert!(data["discountId"].is_string());
    assert_eq!(app.discounts.count(SHOP).await, 1);
    assert_eq!(app.store.link_count(SHOP).await, 1);
}

#[tokio::test]
async fn invalid_bundle_returns_400() {
    let app = build_test_app();
    let response = post_json(&app.router, "/api/v1/bundles", bundle_body("solo", &["p1"], 10.0)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    assert_eq!(app.bundles.count(SHOP).await, 0);
}

#[tokio::test]
async fn remote_discount_failure_returns_502_and_rolls_back() {
    let app = build_test_app();
    app.discounts.set_fail_on_create(true).await;

    let response = post_json(&app.router, "/api/v1/bundles", bundle_body("pair", &["p1", "p2"], 10.0)).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "REMOTE_ERROR");
    assert_eq!(app.bundles.count(SHOP).await, 0);
}

#[tokio::test]
async fn get_and_list_include_discount_id() {
    let app = build_test_app();
    let created = create(&app, "pair", &["p1", "p2"]).await;
    let id = created["id"].as_str().unwrap();

    let response = get(&app.router, &format!("/api/v1/bundles/{}", path_id(id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["discountId"], created["discountId"]);

    let list = body_json(get(&app.router, "/api/v1/bundles").await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn patch_components_replaces_discount() {
    let app = build_test_app();
    let created = create(&app, "pair", &["p1", "p2"]).await;
    let id = created["id"].as_str().unwrap();

    let response = patch_json(
        &app.router,
        &format!("/api/v1/bundles/{}", path_id(id)),
        json!({ "components": [
            { "productId": "p1", "quantity": 1 },
            { "productId": "p9", "quantity": 2 }
        ]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();

    assert_ne!(data["discountId"], created["discountId"]);
    let discount = app
        .discounts
        .get(data["discountId"].as_str().unwrap())
        .await
        .unwrap();
    assert_eq!(discount.product_ids, vec!["p1".to_string(), "p9".to_string()]);
}

#[tokio::test]
async fn failed_replacement_returns_503_then_retry_succeeds() {
    let app = build_test_app();
    let created = create(&app, "pair", &["p1", "p2"]).await;
    let uri = format!("/api/v1/bundles/{}", path_id(created["id"].as_str().unwrap()));
    let patch = json!({ "components": [
        { "productId": "p3", "quantity": 1 },
        { "productId": "p4", "quantity": 1 }
    ]});

    app.discounts.set_fail_on_create(true).await;
    let response = patch_json(&app.router, &uri, patch.clone()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "PARTIAL_UPDATE");

    let orphans = body_json(get(&app.router, "/api/v1/bundles/orphaned").await).await;
    assert_eq!(orphans["data"][0]["reason"], "PENDING_DISCOUNT");

    app.discounts.set_fail_on_create(false).await;
    let response = patch_json(&app.router, &uri, patch).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.discounts.count(SHOP).await, 1);
}

#[tokio::test]
async fn patch_unknown_bundle_returns_404() {
    let app = build_test_app();
    let response = patch_json(&app.router, "/api/v1/bundles/missing", json!({ "title": "x" })).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_returns_204_then_get_404() {
    let app = build_test_app();
    let created = create(&app, "pair", &["p1", "p2"]).await;
    let uri = format!("/api/v1/bundles/{}", path_id(created["id"].as_str().unwrap()));

    assert_eq!(delete(&app.router, &uri).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(get(&app.router, &uri).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.discounts.count(SHOP).await, 0);
    assert_eq!(app.store.link_count(SHOP).await, 0);
}

#[tokio::test]
async fn import_reports_per_item_results() {
    let app = build_test_app();
    let response = post_json(
        &app.router,
        "/api/v1/bundles/import",
        json!({ "bundles": [
            bundle_body("a", &["p1", "p2"], 10.0),
            bundle_body("b", &["p3"], 10.0),
            bundle_body("c", &["p4", "p5"], 20.0),
        ]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["success"], json!(["a", "c"]));
    assert_eq!(data["failed"][0]["name"], "b");
    assert!(data["failed"][0]["error"].is_string());
    assert_eq!(app.bundles.count(SHOP).await, 2);
}

#[tokio::test]
async fn empty_import_returns_400() {
    let app = build_test_app();
    let response = post_json(&app.router, "/api/v1/bundles/import", json!({ "bundles": [] })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
