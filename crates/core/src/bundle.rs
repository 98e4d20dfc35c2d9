//! Bundle domain types, input validation, and discount derivation.
//!
//! A bundle is a primary product plus companions sold together at a
//! percentage discount. The canonical record lives on the commerce
//! platform; this module holds the shapes exchanged with it and the pure
//! rules every input must satisfy before any remote call is attempted.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::threshold_validation::{validate_count_range, validate_percent};
use crate::types::{RemoteId, Timestamp};

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Minimum number of distinct products a bundle must contain.
pub const MIN_DISTINCT_PRODUCTS: usize = 2;

/// Maximum number of bundles accepted by a single import request.
pub const MAX_IMPORT_BUNDLES: usize = 250;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Bundle lifecycle status as stored on the commerce platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BundleStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Archived,
}

impl BundleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl std::str::FromStr for BundleStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "ACTIVE" => Ok(Self::Active),
            "PAUSED" => Ok(Self::Paused),
            "ARCHIVED" => Ok(Self::Archived),
            other => Err(CoreError::Validation(format!(
                "Unknown bundle status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Entity types
// ---------------------------------------------------------------------------

/// One line of a bundle: a product, optionally pinned to a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BundleComponent {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: u32,
}

impl BundleComponent {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: None,
            quantity,
        }
    }
}

/// A bundle as read back from the commerce platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub id: RemoteId,
    pub shop: String,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub discount_percent: f64,
    pub components: Vec<BundleComponent>,
    pub status: BundleStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Bundle {
    /// Apply a validated patch in place, bumping `updated_at`.
    pub fn apply_patch(&mut self, patch: &BundlePatch, now: Timestamp) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(percent) = patch.discount_percent {
            self.discount_percent = percent;
        }
        if let Some(components) = &patch.components {
            self.components = components.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
    }
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

/// Input for creating a bundle.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBundle {
    /// Internal label, unique per shop.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Customer-facing title.
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub discount_percent: f64,
    #[validate(nested)]
    pub components: Vec<BundleComponent>,
    #[serde(default)]
    pub status: BundleStatus,
}

/// Partial update of a bundle. `name` is the bundle's stable handle and
/// cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BundlePatch {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub discount_percent: Option<f64>,
    pub components: Option<Vec<BundleComponent>>,
    pub status: Option<BundleStatus>,
}

impl BundlePatch {
    /// Whether the patch changes the bundle's product set.
    pub fn touches_components(&self) -> bool {
        self.components.is_some()
    }

    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.discount_percent.is_none()
            && self.components.is_none()
            && self.status.is_none()
    }
}

/// The discount a bundle should carry, derived deterministically from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountDraft {
    pub title: String,
    pub percent: f64,
    pub product_ids: Vec<String>,
    pub starts_at: Timestamp,
    pub ends_at: Option<Timestamp>,
}

impl DiscountDraft {
    /// The same discount with a schedule that already ended at `now`.
    pub fn ended(mut self, now: Timestamp) -> Self {
        self.starts_at = now - chrono::Duration::seconds(1);
        self.ends_at = Some(now);
        self
    }
}

// ---------------------------------------------------------------------------
// Import report
// ---------------------------------------------------------------------------

/// A single failed item in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of a batch operation where each item fails independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub success: Vec<String>,
    pub failed: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn record_success(&mut self, name: impl Into<String>) {
        self.success.push(name.into());
    }

    pub fn record_failure(&mut self, name: impl Into<String>, error: impl ToString) {
        self.failed.push(ImportFailure {
            name: name.into(),
            error: error.to_string(),
        });
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Title of the automatic discount backing a bundle.
pub fn discount_title(bundle_name: &str) -> String {
    format!("Bundle discount: {bundle_name}")
}

/// Distinct product ids in first-seen order.
pub fn product_ids(components: &[BundleComponent]) -> Vec<String> {
    let mut seen = HashSet::new();
    components
        .iter()
        .filter(|c| seen.insert(c.product_id.as_str()))
        .map(|c| c.product_id.clone())
        .collect()
}

/// Build the discount for a bundle, active from `now` with no end date.
pub fn discount_for(
    bundle_name: &str,
    percent: f64,
    components: &[BundleComponent],
    now: Timestamp,
) -> DiscountDraft {
    DiscountDraft {
        title: discount_title(bundle_name),
        percent,
        product_ids: product_ids(components),
        starts_at: now,
        ends_at: None,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a component list: at least [`MIN_DISTINCT_PRODUCTS`] distinct
/// products and no repeated `(product, variant)` line.
pub fn validate_components(components: &[BundleComponent]) -> Result<(), CoreError> {
    let mut lines = HashSet::new();
    for c in components {
        c.validate()?;
        if !lines.insert((c.product_id.as_str(), c.variant_id.as_deref())) {
            return Err(CoreError::Validation(format!(
                "Product {} appears more than once in the bundle",
                c.product_id
            )));
        }
    }

    let distinct = product_ids(components).len();
    if distinct < MIN_DISTINCT_PRODUCTS {
        return Err(CoreError::Validation(format!(
            "A bundle needs at least {MIN_DISTINCT_PRODUCTS} distinct products, got {distinct}"
        )));
    }
    Ok(())
}

/// Validate a create request before any remote call.
pub fn validate_new_bundle(input: &NewBundle) -> Result<(), CoreError> {
    input.validate()?;
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("name must not be blank".into()));
    }
    validate_percent(input.discount_percent, "discountPercent")?;
    validate_components(&input.components)
}

/// Validate an update request before any remote call.
pub fn validate_patch(patch: &BundlePatch) -> Result<(), CoreError> {
    if patch.is_empty() {
        return Err(CoreError::Validation(
            "Update must change at least one field".into(),
        ));
    }
    patch.validate()?;
    if let Some(percent) = patch.discount_percent {
        validate_percent(percent, "discountPercent")?;
    }
    if let Some(components) = &patch.components {
        validate_components(components)?;
    }
    Ok(())
}

/// Validate the size of an import batch.
pub fn validate_import_count(count: usize) -> Result<(), CoreError> {
    validate_count_range(count, MAX_IMPORT_BUNDLES, "Import")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
