//! Integration tests for the bundle/discount correlation table.

use bundlewise_db::models::discount_link::UpsertDiscountLink;
use bundlewise_db::repositories::DiscountLinkRepo;
use sqlx::PgPool;

const SHOP: &str = "acme.myshopify.com";

fn link(bundle_id: &str, discount_id: Option<&str>) -> UpsertDiscountLink {
    UpsertDiscountLink {
        bundle_id: bundle_id.to_string(),
        discount_id: discount_id.map(str::to_string),
        discount_active: true,
        bundle_name: format!("name-{bundle_id}"),
        shop: SHOP.to_string(),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upsert_keeps_one_row_per_bundle(pool: PgPool) {
    let first = DiscountLinkRepo::upsert(&pool, &link("b1", Some("d1")))
        .await
        .unwrap();
    let second = DiscountLinkRepo::upsert(&pool, &link("b1", Some("d2")))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.discount_id.as_deref(), Some("d2"));

    let all = DiscountLinkRepo::list_by_shop(&pool, SHOP).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_insert_violates_unique_bundle(pool: PgPool) {
    DiscountLinkRepo::upsert(&pool, &link("b1", Some("d1")))
        .await
        .unwrap();

    let err = sqlx::query(
        "INSERT INTO bundle_discounts (bundle_id, discount_id, bundle_name, shop) \
         VALUES ('b1', 'd9', 'other', $1)",
    )
    .bind(SHOP)
    .execute(&pool)
    .await
    .unwrap_err();

    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("uq_bundle_discounts_bundle_id"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pending_marker_round_trip(pool: PgPool) {
    DiscountLinkRepo::upsert(&pool, &link("b1", Some("d1")))
        .await
        .unwrap();

    let pending = DiscountLinkRepo::set_discount_id(&pool, SHOP, "b1", None)
        .await
        .unwrap()
        .unwrap();
    assert!(pending.is_pending());

    let restored = DiscountLinkRepo::set_discount_id(&pool, SHOP, "b1", Some("d2"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restored.discount_id.as_deref(), Some("d2"));

    let missing = DiscountLinkRepo::set_discount_id(&pool, SHOP, "nope", Some("d3"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_links_are_scoped_by_shop(pool: PgPool) {
    DiscountLinkRepo::upsert(&pool, &link("b1", Some("d1")))
        .await
        .unwrap();

    let other = DiscountLinkRepo::find_by_bundle_id(&pool, "other.myshopify.com", "b1")
        .await
        .unwrap();
    assert!(other.is_none());

    let found = DiscountLinkRepo::find_by_bundle_id(&pool, SHOP, "b1")
        .await
        .unwrap();
    assert!(found.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_discount_active_flag_survives_replacement(pool: PgPool) {
    let created = DiscountLinkRepo::upsert(&pool, &link("b1", Some("d1")))
        .await
        .unwrap();
    assert!(created.discount_active);

    let off = DiscountLinkRepo::set_discount_active(&pool, SHOP, "b1", false)
        .await
        .unwrap()
        .unwrap();
    assert!(!off.discount_active);

    let replaced = DiscountLinkRepo::set_discount_id(&pool, SHOP, "b1", Some("d2"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replaced.discount_id.as_deref(), Some("d2"));
    assert!(!replaced.discount_active);

    let missing = DiscountLinkRepo::set_discount_active(&pool, SHOP, "nope", true)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_link(pool: PgPool) {
    DiscountLinkRepo::upsert(&pool, &link("b1", Some("d")))
        .await
        .unwrap();

    assert!(DiscountLinkRepo::delete(&pool, SHOP, "b1").await.unwrap());
    assert!(!DiscountLinkRepo::delete(&pool, SHOP, "b1").await.unwrap());
    assert!(DiscountLinkRepo::list_shops(&pool).await.unwrap().is_empty());
}
