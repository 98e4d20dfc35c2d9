//! Remote interfaces consumed by the engine.
//!
//! Each call is one remote round trip. None of them are transactional with
//! each other; callers compose them into sagas.

use async_trait::async_trait;
use bundlewise_core::auto_bundle::CatalogProduct;
use bundlewise_core::bundle::{Bundle, BundlePatch, DiscountDraft, NewBundle};
use bundlewise_core::types::{RemoteId, Timestamp};

use crate::error::RemoteError;

/// Canonical bundle definitions.
#[async_trait]
pub trait BundleStore: Send + Sync {
    async fn create(&self, shop: &str, input: &NewBundle) -> Result<Bundle, RemoteError>;

    async fn get(&self, shop: &str, id: &str) -> Result<Option<Bundle>, RemoteError>;

    /// Look a bundle up by its unique name.
    async fn find_by_name(&self, shop: &str, name: &str) -> Result<Option<Bundle>, RemoteError>;

    async fn list(&self, shop: &str) -> Result<Vec<Bundle>, RemoteError>;

    async fn update(
        &self,
        shop: &str,
        id: &str,
        patch: &BundlePatch,
    ) -> Result<Bundle, RemoteError>;

    async fn delete(&self, shop: &str, id: &str) -> Result<(), RemoteError>;
}

/// Automatic percentage discounts scoped to a product set.
#[async_trait]
pub trait DiscountStore: Send + Sync {
    async fn create(&self, shop: &str, draft: &DiscountDraft) -> Result<RemoteId, RemoteError>;

    /// Change the percentage without touching the product set.
    async fn update_percentage(&self, shop: &str, id: &str, percent: f64)
        -> Result<(), RemoteError>;

    async fn delete(&self, shop: &str, id: &str) -> Result<(), RemoteError>;

    /// Switch a discount on or off through its schedule. Activation resets
    /// the start to `now` and clears the end; deactivation ends it at `now`.
    async fn toggle(
        &self,
        shop: &str,
        id: &str,
        active: bool,
        now: Timestamp,
    ) -> Result<(), RemoteError>;
}

/// Read-only product catalog used by rule evaluation.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn list_products(&self, shop: &str) -> Result<Vec<CatalogProduct>, RemoteError>;
}
