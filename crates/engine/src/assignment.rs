//! Sticky A/B variant assignment.
//!
//! A shopper keeps the variant first assigned to their session for a given
//! product until the assignment expires. Creation is an atomic
//! find-or-create in the store, so concurrent first visits for the same key
//! all observe one row.

use std::sync::Arc;

use bundlewise_core::ab_testing::{
    assignment_expiry, choose_recommendation, validate_assignment_key, variant_group_for,
};
use bundlewise_core::error::CoreError;
use bundlewise_core::shop::normalize_shop_domain;
use bundlewise_core::types::Timestamp;
use bundlewise_db::models::ab_assignment::AssignmentKey;
use chrono::Utc;
use serde::Serialize;

use crate::store::{AssignmentStore, RecommendationStore};

/// Result of an assignment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub variant_group_id: String,
    pub expires_at: Timestamp,
    /// Whether this request created the assignment.
    pub created: bool,
}

pub struct AssignmentService {
    recommendations: Arc<dyn RecommendationStore>,
    assignments: Arc<dyn AssignmentStore>,
}

impl AssignmentService {
    pub fn new(
        recommendations: Arc<dyn RecommendationStore>,
        assignments: Arc<dyn AssignmentStore>,
    ) -> Self {
        Self {
            recommendations,
            assignments,
        }
    }

    pub async fn assign(
        &self,
        shop: &str,
        session_id: &str,
        product_id: &str,
    ) -> Result<Assignment, CoreError> {
        self.assign_at(shop, session_id, product_id, Utc::now()).await
    }

    /// [`assign`](Self::assign) evaluated at a fixed instant.
    pub async fn assign_at(
        &self,
        shop: &str,
        session_id: &str,
        product_id: &str,
        now: Timestamp,
    ) -> Result<Assignment, CoreError> {
        let shop = normalize_shop_domain(shop)?;
        validate_assignment_key(session_id, product_id)?;
        let key = AssignmentKey::new(shop, session_id, product_id);

        if let Some(existing) = self.assignments.find_active(&key, now).await? {
            return Ok(Assignment {
                variant_group_id: existing.variant_group_id,
                expires_at: existing.expires_at,
                created: false,
            });
        }

        let candidates = self
            .recommendations
            .active_for_product(&key.shop, product_id)
            .await?;
        let chosen = choose_recommendation(&candidates)
            .ok_or_else(|| CoreError::not_found("AIRecommendation", product_id))?;
        let variant = variant_group_for(chosen);

        let (row, created) = self
            .assignments
            .find_or_create(&key, &variant, assignment_expiry(now), now)
            .await?;
        if created {
            tracing::debug!(
                shop = %key.shop,
                product_id,
                variant_group_id = %row.variant_group_id,
                "Variant assigned"
            );
        }

        Ok(Assignment {
            variant_group_id: row.variant_group_id,
            expires_at: row.expires_at,
            created,
        })
    }
}
