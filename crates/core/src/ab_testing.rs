//! Sticky variant assignment: constants and pure selection logic.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// How long an assignment stays sticky.
pub const ASSIGNMENT_TTL_DAYS: i64 = 7;

/// Maximum accepted length of a storefront session id.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// A recommendation considered for assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationCandidate {
    pub product_id: String,
    pub bundled_product_ids: Vec<String>,
    pub confidence_score: f64,
    pub variant_group_id: Option<String>,
    pub is_active: bool,
}

/// Expiry of an assignment created at `now`.
pub fn assignment_expiry(now: Timestamp) -> Timestamp {
    now + chrono::Duration::days(ASSIGNMENT_TTL_DAYS)
}

/// Pick the active recommendation with the highest confidence.
///
/// Ties keep the first candidate, so callers that pass a stable order get
/// a stable choice.
pub fn choose_recommendation(
    candidates: &[RecommendationCandidate],
) -> Option<&RecommendationCandidate> {
    candidates
        .iter()
        .filter(|c| c.is_active)
        .fold(None, |best: Option<&RecommendationCandidate>, c| match best {
            Some(b) if b.confidence_score >= c.confidence_score => Some(b),
            _ => Some(c),
        })
}

/// Variant group of a chosen recommendation, or a fresh random group.
pub fn variant_group_for(candidate: &RecommendationCandidate) -> String {
    candidate
        .variant_group_id
        .clone()
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Validate the key of an assignment request.
pub fn validate_assignment_key(session_id: &str, product_id: &str) -> Result<(), CoreError> {
    if session_id.trim().is_empty() {
        return Err(CoreError::Validation("sessionId is required".into()));
    }
    if session_id.len() > MAX_SESSION_ID_LEN {
        return Err(CoreError::Validation(format!(
            "sessionId must be at most {MAX_SESSION_ID_LEN} characters"
        )));
    }
    if product_id.trim().is_empty() {
        return Err(CoreError::Validation("productId is required".into()));
    }
    Ok(())
}
