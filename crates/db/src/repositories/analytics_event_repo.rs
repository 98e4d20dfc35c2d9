//! Repository for the append-only `analytics_events` table.

use bundlewise_core::analytics::VARIANT_METADATA_KEY;
use bundlewise_core::types::DbId;
use sqlx::PgPool;

use crate::models::analytics_event::{EventFact, NewAnalyticsEvent};

/// Provides append and read operations for analytics events.
pub struct AnalyticsEventRepo;

impl AnalyticsEventRepo {
    /// Append an event, returning its id.
    pub async fn insert(pool: &PgPool, input: &NewAnalyticsEvent) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO analytics_events \
                (shop, bundle_id, product_id, event_type, session_id, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(&input.shop)
        .bind(input.bundle_id.as_deref())
        .bind(&input.product_id)
        .bind(&input.event_type)
        .bind(&input.session_id)
        .bind(&input.metadata)
        .fetch_one(pool)
        .await
    }

    /// Event type and variant group of every matching event. Only a
    /// non-empty string counts as a variant group.
    pub async fn list_facts(
        pool: &PgPool,
        shop: &str,
        product_id: Option<&str>,
    ) -> Result<Vec<EventFact>, sqlx::Error> {
        sqlx::query_as::<_, EventFact>(
            "SELECT event_type, \
                 CASE WHEN jsonb_typeof(metadata -> $3) = 'string' \
                      THEN NULLIF(metadata ->> $3, '') END AS variant_group_id \
             FROM analytics_events \
             WHERE shop = $1 AND ($2::TEXT IS NULL OR product_id = $2)",
        )
        .bind(shop)
        .bind(product_id)
        .bind(VARIANT_METADATA_KEY)
        .fetch_all(pool)
        .await
    }
}
