//! Storefront analytics event model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The two columns the aggregator needs from each event.
#[derive(Debug, Clone, FromRow)]
pub struct EventFact {
    pub event_type: String,
    pub variant_group_id: Option<String>,
}

/// DTO for appending an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnalyticsEvent {
    pub shop: String,
    pub bundle_id: Option<String>,
    pub product_id: String,
    pub event_type: String,
    pub session_id: String,
    pub metadata: serde_json::Value,
}
