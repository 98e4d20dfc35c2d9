//! Auto-bundle rule lifecycle.

mod common;

use assert_matches::assert_matches;
use bundlewise_core::auto_bundle::{generated_bundle_name, NewRule};
use bundlewise_core::bundle::BundlePatch;
use bundlewise_core::error::{CoreError, RemoteResource};
use bundlewise_engine::store::{LinkStore, RuleStore};
use chrono::{Duration, Utc};
use common::{components, product, Harness, SHOP};

fn summer_rule(name: &str, active: bool) -> NewRule {
    NewRule {
        name: name.to_string(),
        collections: vec![],
        tags: vec!["summer".into()],
        min_price: 0.0,
        max_price: 0.0,
        min_products: 2,
        discount_percent: 15.0,
        is_active: active,
    }
}

async fn seeded() -> Harness {
    let h = Harness::new();
    h.catalog
        .set_products(
            SHOP,
            vec![
                product("p3", 30.0, &["summer"]),
                product("p1", 10.0, &["Summer"]),
                product("p2", 20.0, &["summer"]),
                product("w1", 5.0, &["winter"]),
            ],
        )
        .await;
    h
}

async fn linked_discount(h: &Harness, bundle_id: &str) -> String {
    LinkStore::find(h.store.as_ref(), SHOP, bundle_id)
        .await
        .unwrap()
        .and_then(|l| l.discount_id)
        .expect("bundle should have a live discount")
}

#[tokio::test]
async fn active_rule_generates_bundle_from_matching_products() {
    let h = seeded().await;
    let rule = h.rules.create_rule(SHOP, &summer_rule("Summer", true)).await.unwrap();

    let bundle = h
        .sync
        .find_by_name(SHOP, &generated_bundle_name(rule.id))
        .await
        .unwrap()
        .unwrap();
    let ids: Vec<_> = bundle.components.iter().map(|c| c.product_id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3"]);
    assert_eq!(bundle.discount_percent, 15.0);

    let discount_id = linked_discount(&h, &bundle.id).await;
    assert!(h.discounts.get(&discount_id).await.unwrap().is_active_at(Utc::now()));
}

#[tokio::test]
async fn inactive_rule_creates_nothing_remote() {
    let h = seeded().await;
    let rule = h.rules.create_rule(SHOP, &summer_rule("Later", false)).await.unwrap();
    assert!(!rule.is_active);
    assert_eq!(h.bundles.count(SHOP).await, 0);
}

#[tokio::test]
async fn failed_activation_keeps_rule_inactive() {
    let h = Harness::new();
    h.catalog
        .set_products(SHOP, vec![product("p1", 10.0, &["summer"])])
        .await;

    let err = h
        .rules
        .create_rule(SHOP, &summer_rule("Too few", true))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));

    let rules = h.rules.list_rules(SHOP).await.unwrap();
    assert_eq!(rules.len(), 1);
    assert!(!rules[0].is_active);
}

#[tokio::test]
async fn duplicate_rule_name_conflicts() {
    let h = seeded().await;
    h.rules.create_rule(SHOP, &summer_rule("Same", false)).await.unwrap();
    let err = h
        .rules
        .create_rule(SHOP, &summer_rule("Same", false))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));
}

#[tokio::test]
async fn toggling_off_and_on_reuses_one_bundle_and_discount() {
    let h = seeded().await;
    let rule = h.rules.create_rule(SHOP, &summer_rule("Summer", true)).await.unwrap();
    let bundle = h
        .sync
        .find_by_name(SHOP, &generated_bundle_name(rule.id))
        .await
        .unwrap()
        .unwrap();
    let discount_id = linked_discount(&h, &bundle.id).await;

    let off = h.rules.toggle_rule(SHOP, rule.id, false).await.unwrap();
    assert!(!off.is_active);
    let discount = h.discounts.get(&discount_id).await.unwrap();
    assert!(!discount.is_active_at(Utc::now() + Duration::seconds(1)));

    let on = h.rules.toggle_rule(SHOP, rule.id, true).await.unwrap();
    assert!(on.is_active);

    assert_eq!(h.bundles.count(SHOP).await, 1);
    assert_eq!(h.discounts.count(SHOP).await, 1);
    assert_eq!(h.store.link_count(SHOP).await, 1);
    assert_eq!(linked_discount(&h, &bundle.id).await, discount_id);
    let discount = h.discounts.get(&discount_id).await.unwrap();
    assert!(discount.is_active_at(Utc::now() + Duration::seconds(1)));
}

#[tokio::test]
async fn reactivation_recreates_a_missing_discount() {
    let h = seeded().await;
    let rule = h.rules.create_rule(SHOP, &summer_rule("Summer", true)).await.unwrap();
    let bundle = h
        .sync
        .find_by_name(SHOP, &generated_bundle_name(rule.id))
        .await
        .unwrap()
        .unwrap();
    h.rules.toggle_rule(SHOP, rule.id, false).await.unwrap();
    LinkStore::delete(h.store.as_ref(), SHOP, &bundle.id).await.unwrap();

    h.rules.toggle_rule(SHOP, rule.id, true).await.unwrap();

    assert_eq!(h.bundles.count(SHOP).await, 1);
    assert_eq!(h.store.link_count(SHOP).await, 1);
    linked_discount(&h, &bundle.id).await;
}

#[tokio::test]
async fn component_change_keeps_a_deactivated_discount_off() {
    let h = seeded().await;
    let rule = h.rules.create_rule(SHOP, &summer_rule("Summer", true)).await.unwrap();
    let bundle = h
        .sync
        .find_by_name(SHOP, &generated_bundle_name(rule.id))
        .await
        .unwrap()
        .unwrap();
    let old_id = linked_discount(&h, &bundle.id).await;
    h.rules.toggle_rule(SHOP, rule.id, false).await.unwrap();

    let patch = BundlePatch {
        components: Some(components(&["p1", "p2"])),
        ..Default::default()
    };
    let updated = h.sync.update_bundle(SHOP, &bundle.id, &patch).await.unwrap();
    let new_id = updated.discount_id.unwrap();
    assert_ne!(new_id, old_id);

    let discount = h.discounts.get(&new_id).await.unwrap();
    assert!(!discount.is_active_at(Utc::now() + Duration::seconds(1)));
    assert!(!h.rules.get_rule(SHOP, rule.id).await.unwrap().is_active);

    h.rules.toggle_rule(SHOP, rule.id, true).await.unwrap();
    assert_eq!(linked_discount(&h, &bundle.id).await, new_id);
    let discount = h.discounts.get(&new_id).await.unwrap();
    assert!(discount.is_active_at(Utc::now() + Duration::seconds(1)));
    assert_eq!(h.discounts.count(SHOP).await, 1);
}

#[tokio::test]
async fn catalog_failure_is_a_remote_error() {
    let h = seeded().await;
    h.catalog.set_fail_on_list(true).await;

    let err = h
        .rules
        .create_rule(SHOP, &summer_rule("Summer", true))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        CoreError::RemoteRead {
            resource: RemoteResource::Product,
            ..
        }
    );
    assert!(!h.rules.list_rules(SHOP).await.unwrap()[0].is_active);
}

#[tokio::test]
async fn known_shops_include_shops_with_only_rules() {
    let h = seeded().await;
    h.rules.create_rule(SHOP, &summer_rule("Idle", false)).await.unwrap();
    h.rules
        .create_rule("beta.myshopify.com", &summer_rule("Idle", false))
        .await
        .unwrap();

    let shops = h.rules.known_shops().await.unwrap();
    assert_eq!(shops, vec![SHOP.to_string(), "beta.myshopify.com".to_string()]);
    assert!(h.sync.known_shops().await.unwrap().is_empty());
}

#[tokio::test]
async fn toggle_unknown_rule_is_not_found() {
    let h = seeded().await;
    let err = h.rules.toggle_rule(SHOP, 999, true).await.unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "AutoBundleRule", .. });
}

#[tokio::test]
async fn delete_removes_rule_and_generated_bundle() {
    let h = seeded().await;
    let rule = h.rules.create_rule(SHOP, &summer_rule("Summer", true)).await.unwrap();

    h.rules.delete_rule(SHOP, rule.id).await.unwrap();

    assert!(h.rules.list_rules(SHOP).await.unwrap().is_empty());
    assert_eq!(h.bundles.count(SHOP).await, 0);
    assert_eq!(h.discounts.count(SHOP).await, 0);
    assert_eq!(h.store.link_count(SHOP).await, 0);
}

#[tokio::test]
async fn delete_rule_without_bundle_succeeds() {
    let h = seeded().await;
    let rule = h.rules.create_rule(SHOP, &summer_rule("Idle", false)).await.unwrap();

    h.rules.delete_rule(SHOP, rule.id).await.unwrap();
    assert_matches!(
        h.rules.get_rule(SHOP, rule.id).await,
        Err(CoreError::NotFound { .. })
    );
}

#[tokio::test]
async fn delete_rule_aborts_when_remote_delete_fails() {
    let h = seeded().await;
    let rule = h.rules.create_rule(SHOP, &summer_rule("Summer", true)).await.unwrap();
    h.discounts.set_fail_on_delete(true).await;

    let err = h.rules.delete_rule(SHOP, rule.id).await.unwrap_err();
    assert_matches!(err, CoreError::RemoteDelete { .. });
    assert!(h.rules.get_rule(SHOP, rule.id).await.is_ok());
}

#[tokio::test]
async fn sync_reports_each_active_rule() {
    let h = seeded().await;
    let good = h.rules.create_rule(SHOP, &summer_rule("Summer", false)).await.unwrap();
    let mut winter = summer_rule("Winter", false);
    winter.tags = vec!["winter".into()];
    let bad = h.rules.create_rule(SHOP, &winter).await.unwrap();
    h.rules.create_rule(SHOP, &summer_rule("Idle", false)).await.unwrap();

    h.store.set_active(SHOP, good.id, true).await.unwrap();
    h.store.set_active(SHOP, bad.id, true).await.unwrap();

    let report = h.rules.sync_rules(SHOP).await.unwrap();
    assert_eq!(report.success, vec!["Summer"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "Winter");
    assert_eq!(h.bundles.count(SHOP).await, 1);

    // A second sync finds the existing bundle instead of creating another.
    let again = h.rules.sync_rules(SHOP).await.unwrap();
    assert_eq!(again.success, vec!["Summer"]);
    assert_eq!(h.bundles.count(SHOP).await, 1);
    assert_eq!(h.discounts.count(SHOP).await, 1);
}
