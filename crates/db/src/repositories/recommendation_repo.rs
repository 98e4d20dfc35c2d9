//! Repository for the `ai_recommendations` table.

use sqlx::PgPool;

use crate::models::recommendation::{AiRecommendation, NewRecommendation};

/// Column list for `ai_recommendations` queries.
const COLUMNS: &str = "\
    id, shop, product_id, bundled_product_ids, confidence_score, \
    variant_group_id, is_active, created_at, updated_at";

/// Provides read access to recommendations, plus inserts for the
/// generator that produces them.
pub struct RecommendationRepo;

impl RecommendationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &NewRecommendation,
    ) -> Result<AiRecommendation, sqlx::Error> {
        let query = format!(
            "INSERT INTO ai_recommendations \
                (shop, product_id, bundled_product_ids, confidence_score, variant_group_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AiRecommendation>(&query)
            .bind(&input.shop)
            .bind(&input.product_id)
            .bind(&input.bundled_product_ids)
            .bind(input.confidence_score)
            .bind(input.variant_group_id.as_deref())
            .fetch_one(pool)
            .await
    }

    /// All active recommendations for a product, best first.
    pub async fn list_active_for_product(
        pool: &PgPool,
        shop: &str,
        product_id: &str,
    ) -> Result<Vec<AiRecommendation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ai_recommendations \
             WHERE shop = $1 AND product_id = $2 AND is_active = TRUE \
             ORDER BY confidence_score DESC, id ASC"
        );
        sqlx::query_as::<_, AiRecommendation>(&query)
            .bind(shop)
            .bind(product_id)
            .fetch_all(pool)
            .await
    }
}
