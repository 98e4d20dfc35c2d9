//! Auto-bundle rule endpoints.

mod common;

use axum::http::StatusCode;
use bundlewise_core::auto_bundle::CatalogProduct;
use common::{body_json, build_test_app, delete, get, post_json, TestApp, SHOP};
use serde_json::json;

fn product(id: &str, price: f64) -> CatalogProduct {
    CatalogProduct {
        id: id.to_string(),
        title: format!("Product {id}"),
        price,
        tags: vec!["summer".into()],
        collections: vec![],
    }
}

async fn seeded_app() -> TestApp {
    let app = build_test_app();
    app.catalog
        .set_products(SHOP, vec![product("p1", 10.0), product("p2", 12.0)])
        .await;
    app
}

fn rule_body(name: &str, active: bool) -> serde_json::Value {
    json!({
        "name": name,
        "tags": ["summer"],
        "minProducts": 2,
        "discountPercent": 12.5,
        "isActive": active,
    })
}

#[tokio::test]
async fn create_active_rule_generates_bundle() {
    let app = seeded_app().await;
    let response = post_json(&app.router, "/api/v1/rules", rule_body("Summer", true)).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["isActive"], true);
    assert_eq!(app.bundles.count(SHOP).await, 1);
    assert_eq!(app.discounts.count(SHOP).await, 1);

    let list = body_json(get(&app.router, "/api/v1/rules").await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_rule_returns_400() {
    let app = seeded_app().await;
    let mut body = rule_body("Bad", false);
    body["minProducts"] = json!(1);

    let response = post_json(&app.router, "/api/v1/rules", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn toggle_round_trip_keeps_one_discount() {
    let app = seeded_app().await;
    let created = body_json(post_json(&app.router, "/api/v1/rules", rule_body("Summer", true)).await).await;
    let id = created["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/rules/{id}/toggle");

    let off = post_json(&app.router, &uri, json!({ "isActive": false })).await;
    assert_eq!(off.status(), StatusCode::OK);
    assert_eq!(body_json(off).await["data"]["isActive"], false);

    let on = post_json(&app.router, &uri, json!({ "isActive": true })).await;
    assert_eq!(on.status(), StatusCode::OK);

    assert_eq!(app.bundles.count(SHOP).await, 1);
    assert_eq!(app.discounts.count(SHOP).await, 1);
}

#[tokio::test]
async fn delete_rule_returns_204() {
    let app = seeded_app().await;
    let created = body_json(post_json(&app.router, "/api/v1/rules", rule_body("Summer", true)).await).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = delete(&app.router, &format!("/api/v1/rules/{id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.bundles.count(SHOP).await, 0);

    let again = delete(&app.router, &format!("/api/v1/rules/{id}")).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sync_returns_report() {
    let app = seeded_app().await;
    post_json(&app.router, "/api/v1/rules", rule_body("Summer", true)).await;

    let response = post_json(&app.router, "/api/v1/rules/sync", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["success"], json!(["Summer"]));
    assert_eq!(data["failed"], json!([]));
}
