//! Sticky variant assignment model.

use bundlewise_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `ab_assignments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbAssignment {
    pub id: DbId,
    pub shop: String,
    pub session_id: String,
    pub product_id: String,
    pub variant_group_id: String,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// Lookup key of an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssignmentKey {
    pub shop: String,
    pub session_id: String,
    pub product_id: String,
}

impl AssignmentKey {
    pub fn new(
        shop: impl Into<String>,
        session_id: impl Into<String>,
        product_id: impl Into<String>,
    ) -> Self {
        Self {
            shop: shop.into(),
            session_id: session_id.into(),
            product_id: product_id.into(),
        }
    }

    /// Single string used to derive the per-key advisory lock.
    pub fn lock_key(&self) -> String {
        format!("{}|{}|{}", self.shop, self.session_id, self.product_id)
    }
}
