//! AI recommendation model.

use bundlewise_core::ab_testing::RecommendationCandidate;
use bundlewise_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `ai_recommendations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRecommendation {
    pub id: DbId,
    pub shop: String,
    pub product_id: String,
    pub bundled_product_ids: Vec<String>,
    pub confidence_score: f64,
    pub variant_group_id: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<AiRecommendation> for RecommendationCandidate {
    fn from(row: AiRecommendation) -> Self {
        Self {
            product_id: row.product_id,
            bundled_product_ids: row.bundled_product_ids,
            confidence_score: row.confidence_score,
            variant_group_id: row.variant_group_id,
            is_active: row.is_active,
        }
    }
}

/// DTO for recording a generated recommendation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecommendation {
    pub shop: String,
    pub product_id: String,
    pub bundled_product_ids: Vec<String>,
    pub confidence_score: f64,
    pub variant_group_id: Option<String>,
}
