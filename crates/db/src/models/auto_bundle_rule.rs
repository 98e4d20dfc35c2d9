//! Auto-bundle rule model.

use bundlewise_core::auto_bundle::RuleCriteria;
use bundlewise_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `auto_bundle_rules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoBundleRule {
    pub id: DbId,
    pub shop: String,
    pub name: String,
    pub collections: Vec<String>,
    pub tags: Vec<String>,
    pub min_price: f64,
    pub max_price: f64,
    pub min_products: i32,
    pub discount_percent: f64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AutoBundleRule {
    pub fn criteria(&self) -> RuleCriteria {
        RuleCriteria {
            collections: self.collections.clone(),
            tags: self.tags.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            min_products: self.min_products,
        }
    }
}
