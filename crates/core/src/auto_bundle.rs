//! Auto-bundle rule criteria and candidate selection.
//!
//! A rule describes which catalog products may be grouped into a generated
//! bundle. Selection is pure: given the rule and a catalog snapshot it
//! returns the products to bundle, or an error when too few match.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::bundle::{BundleComponent, BundleStatus, NewBundle, MIN_DISTINCT_PRODUCTS};
use crate::error::CoreError;
use crate::threshold_validation::validate_percent;
use crate::types::DbId;

/// Upper bound on products placed in a generated bundle.
pub const MAX_RULE_PRODUCTS: usize = 10;

/// Prefix of the deterministic bundle name owned by a rule.
pub const GENERATED_NAME_PREFIX: &str = "auto-rule-";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A product as seen by rule evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub id: String,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ids of the collections the product belongs to.
    #[serde(default)]
    pub collections: Vec<String>,
}

/// Selection criteria of a rule. Empty sets mean "any"; a `max_price` of
/// zero means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCriteria {
    pub collections: Vec<String>,
    pub tags: Vec<String>,
    pub min_price: f64,
    pub max_price: f64,
    pub min_products: i32,
}

/// Input for creating a rule.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewRule {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub collections: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub min_price: f64,
    #[serde(default)]
    pub max_price: f64,
    pub min_products: i32,
    pub discount_percent: f64,
    #[serde(default)]
    pub is_active: bool,
}

impl NewRule {
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

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a rule before it is stored.
pub fn validate_rule(input: &NewRule) -> Result<(), CoreError> {
    input.validate()?;
    validate_percent(input.discount_percent, "discountPercent")?;

    if input.min_products < MIN_DISTINCT_PRODUCTS as i32 {
        return Err(CoreError::Validation(format!(
            "minProducts must be at least {MIN_DISTINCT_PRODUCTS}, got {}",
            input.min_products
        )));
    }
    if input.min_products as usize > MAX_RULE_PRODUCTS {
        return Err(CoreError::Validation(format!(
            "minProducts must be at most {MAX_RULE_PRODUCTS}, got {}",
            input.min_products
        )));
    }
    if input.min_price < 0.0 || input.max_price < 0.0 {
        return Err(CoreError::Validation("Prices must not be negative".into()));
    }
    if input.max_price > 0.0 && input.max_price < input.min_price {
        return Err(CoreError::Validation(format!(
            "maxPrice ({}) must be 0 or at least minPrice ({})",
            input.max_price, input.min_price
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Name of the bundle generated for a rule. Stable across activations so
/// repeated activation finds the same bundle.
pub fn generated_bundle_name(rule_id: DbId) -> String {
    format!("{GENERATED_NAME_PREFIX}{rule_id}")
}

/// Whether a product satisfies every criterion of the rule.
pub fn matches(criteria: &RuleCriteria, product: &CatalogProduct) -> bool {
    let in_collection = criteria.collections.is_empty()
        || product
            .collections
            .iter()
            .any(|c| criteria.collections.contains(c));

    let has_tag = criteria.tags.is_empty()
        || product.tags.iter().any(|t| {
            criteria
                .tags
                .iter()
                .any(|wanted| wanted.eq_ignore_ascii_case(t))
        });

    let above_min = product.price >= criteria.min_price;
    let below_max = criteria.max_price <= 0.0 || product.price <= criteria.max_price;

    in_collection && has_tag && above_min && below_max
}

/// Select the products to bundle for a rule.
///
/// Matches are ordered by ascending price then product id and capped at
/// [`MAX_RULE_PRODUCTS`]. Fails when fewer than `min_products` match.
pub fn select_candidates(
    criteria: &RuleCriteria,
    products: &[CatalogProduct],
) -> Result<Vec<CatalogProduct>, CoreError> {
    let mut seen = HashSet::new();
    let mut selected: Vec<CatalogProduct> = products
        .iter()
        .filter(|p| matches(criteria, p) && seen.insert(p.id.as_str()))
        .cloned()
        .collect();

    selected.sort_by(|a, b| a.price.total_cmp(&b.price).then_with(|| a.id.cmp(&b.id)));

    let required = criteria.min_products.max(MIN_DISTINCT_PRODUCTS as i32) as usize;
    if selected.len() < required {
        return Err(CoreError::Validation(format!(
            "Rule matches {} products, needs at least {required}",
            selected.len()
        )));
    }

    selected.truncate(MAX_RULE_PRODUCTS);
    Ok(selected)
}

/// Build the create request for a rule's generated bundle.
pub fn bundle_for_rule(
    rule_id: DbId,
    rule_name: &str,
    discount_percent: f64,
    candidates: &[CatalogProduct],
) -> NewBundle {
    NewBundle {
        name: generated_bundle_name(rule_id),
        title: rule_name.to_string(),
        description: Some(format!("Generated by auto-bundle rule \"{rule_name}\"")),
        discount_percent,
        components: candidates
            .iter()
            .map(|p| BundleComponent::new(p.id.clone(), 1))
            .collect(),
        status: BundleStatus::Active,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
