//! Repository for the `auto_bundle_rules` table.

use bundlewise_core::auto_bundle::NewRule;
use bundlewise_core::types::DbId;
use sqlx::PgPool;

use crate::models::auto_bundle_rule::AutoBundleRule;

/// Column list for `auto_bundle_rules` queries.
const COLUMNS: &str = "\
    id, shop, name, collections, tags, min_price, max_price, min_products, \
    discount_percent, is_active, created_at, updated_at";

/// Provides CRUD operations for auto-bundle rules.
pub struct AutoBundleRuleRepo;

impl AutoBundleRuleRepo {
    /// Insert a rule. The rule is stored with the requested `is_active`.
    pub async fn create(
        pool: &PgPool,
        shop: &str,
        input: &NewRule,
    ) -> Result<AutoBundleRule, sqlx::Error> {
        let query = format!(
            "INSERT INTO auto_bundle_rules \
                (shop, name, collections, tags, min_price, max_price, min_products, \
                 discount_percent, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AutoBundleRule>(&query)
            .bind(shop)
            .bind(&input.name)
            .bind(&input.collections)
            .bind(&input.tags)
            .bind(input.min_price)
            .bind(input.max_price)
            .bind(input.min_products)
            .bind(input.discount_percent)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        shop: &str,
        id: DbId,
    ) -> Result<Option<AutoBundleRule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM auto_bundle_rules WHERE shop = $1 AND id = $2");
        sqlx::query_as::<_, AutoBundleRule>(&query)
            .bind(shop)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a shop's rules, newest first.
    pub async fn list(pool: &PgPool, shop: &str) -> Result<Vec<AutoBundleRule>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM auto_bundle_rules WHERE shop = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, AutoBundleRule>(&query)
            .bind(shop)
            .fetch_all(pool)
            .await
    }

    /// List a shop's active rules in creation order.
    pub async fn list_active(pool: &PgPool, shop: &str) -> Result<Vec<AutoBundleRule>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM auto_bundle_rules \
             WHERE shop = $1 AND is_active = TRUE ORDER BY id"
        );
        sqlx::query_as::<_, AutoBundleRule>(&query)
            .bind(shop)
            .fetch_all(pool)
            .await
    }

    /// Flip a rule's active flag. Returns `None` if the rule does not exist.
    pub async fn set_active(
        pool: &PgPool,
        shop: &str,
        id: DbId,
        is_active: bool,
    ) -> Result<Option<AutoBundleRule>, sqlx::Error> {
        let query = format!(
            "UPDATE auto_bundle_rules SET is_active = $3 \
             WHERE shop = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AutoBundleRule>(&query)
            .bind(shop)
            .bind(id)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a rule. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, shop: &str, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM auto_bundle_rules WHERE shop = $1 AND id = $2")
            .bind(shop)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Distinct shops that have at least one rule.
    pub async fn list_shops(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT DISTINCT shop FROM auto_bundle_rules ORDER BY shop")
            .fetch_all(pool)
            .await
    }
}
