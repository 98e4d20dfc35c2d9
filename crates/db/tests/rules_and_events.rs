//! Integration tests for auto-bundle rules, recommendations and events.

use bundlewise_core::auto_bundle::NewRule;
use bundlewise_db::models::analytics_event::NewAnalyticsEvent;
use bundlewise_db::models::recommendation::NewRecommendation;
use bundlewise_db::repositories::{AnalyticsEventRepo, AutoBundleRuleRepo, RecommendationRepo};
use sqlx::PgPool;

const SHOP: &str = "acme.myshopify.com";

fn rule(name: &str, active: bool) -> NewRule {
    NewRule {
        name: name.to_string(),
        collections: vec!["c1".into()],
        tags: vec!["summer".into()],
        min_price: 5.0,
        max_price: 0.0,
        min_products: 2,
        discount_percent: 15.0,
        is_active: active,
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rule_crud(pool: PgPool) {
    let created = AutoBundleRuleRepo::create(&pool, SHOP, &rule("Summer", true))
        .await
        .unwrap();
    assert_eq!(created.tags, vec!["summer".to_string()]);
    assert_eq!(created.criteria().min_products, 2);

    let off = AutoBundleRuleRepo::set_active(&pool, SHOP, created.id, false)
        .await
        .unwrap()
        .unwrap();
    assert!(!off.is_active);
    assert!(AutoBundleRuleRepo::list_active(&pool, SHOP)
        .await
        .unwrap()
        .is_empty());

    assert!(AutoBundleRuleRepo::delete(&pool, SHOP, created.id).await.unwrap());
    assert!(AutoBundleRuleRepo::find_by_id(&pool, SHOP, created.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rule_name_unique_per_shop(pool: PgPool) {
    AutoBundleRuleRepo::create(&pool, SHOP, &rule("Dup", false))
        .await
        .unwrap();
    let err = AutoBundleRuleRepo::create(&pool, SHOP, &rule("Dup", false))
        .await
        .unwrap_err();
    assert!(err.as_database_error().unwrap().is_unique_violation());

    AutoBundleRuleRepo::create(&pool, "other.myshopify.com", &rule("Dup", false))
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rule_shops_are_distinct(pool: PgPool) {
    AutoBundleRuleRepo::create(&pool, SHOP, &rule("A", false))
        .await
        .unwrap();
    AutoBundleRuleRepo::create(&pool, SHOP, &rule("B", false))
        .await
        .unwrap();
    AutoBundleRuleRepo::create(&pool, "beta.myshopify.com", &rule("A", false))
        .await
        .unwrap();

    let shops = AutoBundleRuleRepo::list_shops(&pool).await.unwrap();
    assert_eq!(shops, vec![SHOP.to_string(), "beta.myshopify.com".to_string()]);
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_recommendations_ordered_by_confidence(pool: PgPool) {
    for (score, group) in [(0.4, "low"), (0.9, "high"), (0.6, "mid")] {
        RecommendationRepo::create(
            &pool,
            &NewRecommendation {
                shop: SHOP.into(),
                product_id: "p1".into(),
                bundled_product_ids: vec!["p2".into()],
                confidence_score: score,
                variant_group_id: Some(group.into()),
            },
        )
        .await
        .unwrap();
    }

    let all = RecommendationRepo::list_active_for_product(&pool, SHOP, "p1")
        .await
        .unwrap();
    let groups: Vec<_> = all.iter().filter_map(|r| r.variant_group_id.as_deref()).collect();
    assert_eq!(groups, vec!["high", "mid", "low"]);
    assert!(RecommendationRepo::list_active_for_product(&pool, SHOP, "p9")
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

fn event(product_id: &str, event_type: &str, metadata: serde_json::Value) -> NewAnalyticsEvent {
    NewAnalyticsEvent {
        shop: SHOP.into(),
        bundle_id: None,
        product_id: product_id.into(),
        event_type: event_type.into(),
        session_id: "s1".into(),
        metadata,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_event_facts_extract_variant(pool: PgPool) {
    let inputs = [
        event("p1", "impression", serde_json::json!({ "variantGroupId": "g1" })),
        event("p1", "click", serde_json::json!({ "variantGroupId": "g1" })),
        event("p1", "impression", serde_json::json!({})),
        event("p2", "purchase", serde_json::json!({ "variantGroupId": "g2" })),
    ];
    for input in &inputs {
        AnalyticsEventRepo::insert(&pool, input).await.unwrap();
    }

    let p1 = AnalyticsEventRepo::list_facts(&pool, SHOP, Some("p1"))
        .await
        .unwrap();
    assert_eq!(p1.len(), 3);
    assert_eq!(
        p1.iter()
            .filter(|f| f.variant_group_id.as_deref() == Some("g1"))
            .count(),
        2
    );
    assert_eq!(p1.iter().filter(|f| f.variant_group_id.is_none()).count(), 1);

    let all = AnalyticsEventRepo::list_facts(&pool, SHOP, None).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_non_string_variant_is_not_a_group(pool: PgPool) {
    let inputs = [
        event("p1", "impression", serde_json::json!({ "variantGroupId": 5 })),
        event("p1", "impression", serde_json::json!({ "variantGroupId": true })),
        event("p1", "impression", serde_json::json!({ "variantGroupId": "" })),
        event("p1", "impression", serde_json::json!({ "variantGroupId": "5" })),
    ];
    for input in &inputs {
        AnalyticsEventRepo::insert(&pool, input).await.unwrap();
    }

    let facts = AnalyticsEventRepo::list_facts(&pool, SHOP, Some("p1"))
        .await
        .unwrap();
    let groups: Vec<_> = facts.iter().filter_map(|f| f.variant_group_id.as_deref()).collect();
    assert_eq!(groups, vec!["5"]);
    assert_eq!(facts.iter().filter(|f| f.variant_group_id.is_none()).count(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_event_type_rejected_by_check(pool: PgPool) {
    let result =
        AnalyticsEventRepo::insert(&pool, &event("p1", "view", serde_json::json!({}))).await;
    assert!(result.is_err());
}
