//! Repository for the `bundle_discounts` correlation table.

use sqlx::PgPool;

use crate::models::discount_link::{DiscountLink, UpsertDiscountLink};

/// Column list for `bundle_discounts` queries.
const COLUMNS: &str =
    "id, bundle_id, discount_id, discount_active, bundle_name, shop, created_at, updated_at";

/// Provides CRUD operations for discount links.
pub struct DiscountLinkRepo;

impl DiscountLinkRepo {
    /// Insert a link, or replace the discount of the existing link for the
    /// same bundle. `bundle_id` is unique so a bundle never has two links.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertDiscountLink,
    ) -> Result<DiscountLink, sqlx::Error> {
        let query = format!(
            "INSERT INTO bundle_discounts (bundle_id, discount_id, discount_active, bundle_name, shop) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (bundle_id) DO UPDATE SET \
                 discount_id = EXCLUDED.discount_id, \
                 discount_active = EXCLUDED.discount_active, \
                 bundle_name = EXCLUDED.bundle_name \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DiscountLink>(&query)
            .bind(&input.bundle_id)
            .bind(input.discount_id.as_deref())
            .bind(input.discount_active)
            .bind(&input.bundle_name)
            .bind(&input.shop)
            .fetch_one(pool)
            .await
    }

    /// Find the link of a bundle within a shop.
    pub async fn find_by_bundle_id(
        pool: &PgPool,
        shop: &str,
        bundle_id: &str,
    ) -> Result<Option<DiscountLink>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM bundle_discounts WHERE shop = $1 AND bundle_id = $2");
        sqlx::query_as::<_, DiscountLink>(&query)
            .bind(shop)
            .bind(bundle_id)
            .fetch_optional(pool)
            .await
    }

    /// Point an existing link at a different discount, or mark it pending
    /// with `None`. Returns `None` if the link does not exist.
    pub async fn set_discount_id(
        pool: &PgPool,
        shop: &str,
        bundle_id: &str,
        discount_id: Option<&str>,
    ) -> Result<Option<DiscountLink>, sqlx::Error> {
        let query = format!(
            "UPDATE bundle_discounts SET discount_id = $3 \
             WHERE shop = $1 AND bundle_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DiscountLink>(&query)
            .bind(shop)
            .bind(bundle_id)
            .bind(discount_id)
            .fetch_optional(pool)
            .await
    }

    /// Record whether the linked discount is switched on. Returns `None` if
    /// the link does not exist.
    pub async fn set_discount_active(
        pool: &PgPool,
        shop: &str,
        bundle_id: &str,
        active: bool,
    ) -> Result<Option<DiscountLink>, sqlx::Error> {
        let query = format!(
            "UPDATE bundle_discounts SET discount_active = $3 \
             WHERE shop = $1 AND bundle_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DiscountLink>(&query)
            .bind(shop)
            .bind(bundle_id)
            .bind(active)
            .fetch_optional(pool)
            .await
    }

    /// Delete the link of a bundle. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, shop: &str, bundle_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bundle_discounts WHERE shop = $1 AND bundle_id = $2")
            .bind(shop)
            .bind(bundle_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List every link of a shop.
    pub async fn list_by_shop(pool: &PgPool, shop: &str) -> Result<Vec<DiscountLink>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM bundle_discounts WHERE shop = $1 ORDER BY bundle_name");
        sqlx::query_as::<_, DiscountLink>(&query)
            .bind(shop)
            .fetch_all(pool)
            .await
    }

    /// Distinct shops that have at least one link.
    pub async fn list_shops(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT DISTINCT shop FROM bundle_discounts ORDER BY shop")
            .fetch_all(pool)
            .await
    }
}
