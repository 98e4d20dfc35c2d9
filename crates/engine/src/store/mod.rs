//! Local store seams.
//!
//! The services depend on these traits rather than on `PgPool` so sagas
//! and races can be tested against [`memory::MemoryStore`]. Production
//! wiring uses [`postgres::PgStore`], which delegates to the repositories in
//! `bundlewise-db`.

use async_trait::async_trait;
use bundlewise_core::ab_testing::RecommendationCandidate;
use bundlewise_core::auto_bundle::NewRule;
use bundlewise_core::error::CoreError;
use bundlewise_core::types::{DbId, Timestamp};
use bundlewise_db::models::ab_assignment::{AbAssignment, AssignmentKey};
use bundlewise_db::models::analytics_event::EventFact;
use bundlewise_db::models::auto_bundle_rule::AutoBundleRule;
use bundlewise_db::models::discount_link::{DiscountLink, UpsertDiscountLink};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => CoreError::Conflict(msg),
            StoreError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                CoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {}",
                    db.constraint().unwrap_or("unknown")
                ))
            }
            other => CoreError::Storage(other.to_string()),
        }
    }
}

/// Bundle-to-discount correlation rows.
#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn upsert(&self, link: &UpsertDiscountLink) -> Result<DiscountLink, StoreError>;

    async fn find(&self, shop: &str, bundle_id: &str) -> Result<Option<DiscountLink>, StoreError>;

    /// Replace the discount id, or mark the link pending with `None`.
    async fn set_discount_id(
        &self,
        shop: &str,
        bundle_id: &str,
        discount_id: Option<&str>,
    ) -> Result<Option<DiscountLink>, StoreError>;

    /// Record whether the linked discount is switched on.
    async fn set_discount_active(
        &self,
        shop: &str,
        bundle_id: &str,
        active: bool,
    ) -> Result<Option<DiscountLink>, StoreError>;

    async fn delete(&self, shop: &str, bundle_id: &str) -> Result<bool, StoreError>;

    async fn list(&self, shop: &str) -> Result<Vec<DiscountLink>, StoreError>;

    /// Every shop with at least one link.
    async fn shops(&self) -> Result<Vec<String>, StoreError>;
}

/// Auto-bundle rule rows.
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn create(&self, shop: &str, input: &NewRule) -> Result<AutoBundleRule, StoreError>;

    async fn get(&self, shop: &str, id: DbId) -> Result<Option<AutoBundleRule>, StoreError>;

    async fn list(&self, shop: &str) -> Result<Vec<AutoBundleRule>, StoreError>;

    async fn list_active(&self, shop: &str) -> Result<Vec<AutoBundleRule>, StoreError>;

    async fn set_active(
        &self,
        shop: &str,
        id: DbId,
        is_active: bool,
    ) -> Result<Option<AutoBundleRule>, StoreError>;

    async fn delete(&self, shop: &str, id: DbId) -> Result<bool, StoreError>;

    /// Every shop with at least one rule.
    async fn shops(&self) -> Result<Vec<String>, StoreError>;
}

/// Read access to generated recommendations.
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Active recommendations for a product, best first.
    async fn active_for_product(
        &self,
        shop: &str,
        product_id: &str,
    ) -> Result<Vec<RecommendationCandidate>, StoreError>;
}

/// Sticky assignment rows.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn find_active(
        &self,
        key: &AssignmentKey,
        now: Timestamp,
    ) -> Result<Option<AbAssignment>, StoreError>;

    /// Atomically return the live assignment for `key` or insert one.
    /// The flag is `true` when this call inserted the row.
    async fn find_or_create(
        &self,
        key: &AssignmentKey,
        variant_group_id: &str,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<(AbAssignment, bool), StoreError>;
}

/// Read side of the append-only analytics log.
#[async_trait]
pub trait EventLog: Send + Sync {
    async fn facts(
        &self,
        shop: &str,
        product_id: Option<&str>,
    ) -> Result<Vec<EventFact>, StoreError>;
}
