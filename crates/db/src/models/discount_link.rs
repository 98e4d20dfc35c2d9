//! Bundle-to-discount correlation model.

use bundlewise_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `bundle_discounts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountLink {
    pub id: DbId,
    pub bundle_id: String,
    /// `None` while the bundle's discount is being replaced.
    pub discount_id: Option<String>,
    /// `false` while the discount is switched off through its schedule.
    pub discount_active: bool,
    pub bundle_name: String,
    pub shop: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DiscountLink {
    /// Whether the link is waiting for a replacement discount.
    pub fn is_pending(&self) -> bool {
        self.discount_id.is_none()
    }
}

/// DTO for inserting or replacing a link.
#[derive(Debug, Clone)]
pub struct UpsertDiscountLink {
    pub bundle_id: String,
    pub discount_id: Option<String>,
    pub discount_active: bool,
    pub bundle_name: String,
    pub shop: String,
}
