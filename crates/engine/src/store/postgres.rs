//! Store traits implemented over the `bundlewise-db` repositories.

use async_trait::async_trait;
use bundlewise_core::ab_testing::RecommendationCandidate;
use bundlewise_core::auto_bundle::NewRule;
use bundlewise_core::types::{DbId, Timestamp};
use bundlewise_db::models::ab_assignment::{AbAssignment, AssignmentKey};
use bundlewise_db::models::analytics_event::EventFact;
use bundlewise_db::models::auto_bundle_rule::AutoBundleRule;
use bundlewise_db::models::discount_link::{DiscountLink, UpsertDiscountLink};
use bundlewise_db::repositories::{
    AbAssignmentRepo, AnalyticsEventRepo, AutoBundleRuleRepo, DiscountLinkRepo,
    RecommendationRepo,
};
use bundlewise_db::DbPool;

use super::{
    AssignmentStore, EventLog, LinkStore, RecommendationStore, RuleStore, StoreError,
};

/// Postgres-backed store. Cheap to clone.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl LinkStore for PgStore {
    async fn upsert(&self, link: &UpsertDiscountLink) -> Result<DiscountLink, StoreError> {
        Ok(DiscountLinkRepo::upsert(&self.pool, link).await?)
    }

    async fn find(&self, shop: &str, bundle_id: &str) -> Result<Option<DiscountLink>, StoreError> {
        Ok(DiscountLinkRepo::find_by_bundle_id(&self.pool, shop, bundle_id).await?)
    }

    async fn set_discount_id(
        &self,
        shop: &str,
        bundle_id: &str,
        discount_id: Option<&str>,
    ) -> Result<Option<DiscountLink>, StoreError> {
        Ok(DiscountLinkRepo::set_discount_id(&self.pool, shop, bundle_id, discount_id).await?)
    }

    async fn set_discount_active(
        &self,
        shop: &str,
        bundle_id: &str,
        active: bool,
    ) -> Result<Option<DiscountLink>, StoreError> {
        Ok(DiscountLinkRepo::set_discount_active(&self.pool, shop, bundle_id, active).await?)
    }

    async fn delete(&self, shop: &str, bundle_id: &str) -> Result<bool, StoreError> {
        Ok(DiscountLinkRepo::delete(&self.pool, shop, bundle_id).await?)
    }

    async fn list(&self, shop: &str) -> Result<Vec<DiscountLink>, StoreError> {
        Ok(DiscountLinkRepo::list_by_shop(&self.pool, shop).await?)
    }

    async fn shops(&self) -> Result<Vec<String>, StoreError> {
        Ok(DiscountLinkRepo::list_shops(&self.pool).await?)
    }
}

#[async_trait]
impl RuleStore for PgStore {
    async fn create(&self, shop: &str, input: &NewRule) -> Result<AutoBundleRule, StoreError> {
        Ok(AutoBundleRuleRepo::create(&self.pool, shop, input).await?)
    }

    async fn get(&self, shop: &str, id: DbId) -> Result<Option<AutoBundleRule>, StoreError> {
        Ok(AutoBundleRuleRepo::find_by_id(&self.pool, shop, id).await?)
    }

    async fn list(&self, shop: &str) -> Result<Vec<AutoBundleRule>, StoreError> {
        Ok(AutoBundleRuleRepo::list(&self.pool, shop).await?)
    }

    async fn list_active(&self, shop: &str) -> Result<Vec<AutoBundleRule>, StoreError> {
        Ok(AutoBundleRuleRepo::list_active(&self.pool, shop).await?)
    }

    async fn set_active(
        &self,
        shop: &str,
        id: DbId,
        is_active: bool,
    ) -> Result<Option<AutoBundleRule>, StoreError> {
        Ok(AutoBundleRuleRepo::set_active(&self.pool, shop, id, is_active).await?)
    }

    async fn delete(&self, shop: &str, id: DbId) -> Result<bool, StoreError> {
        Ok(AutoBundleRuleRepo::delete(&self.pool, shop, id).await?)
    }

    async fn shops(&self) -> Result<Vec<String>, StoreError> {
        Ok(AutoBundleRuleRepo::list_shops(&self.pool).await?)
    }
}

#[async_trait]
impl RecommendationStore for PgStore {
    async fn active_for_product(
        &self,
        shop: &str,
        product_id: &str,
    ) -> Result<Vec<RecommendationCandidate>, StoreError> {
        let rows = RecommendationRepo::list_active_for_product(&self.pool, shop, product_id).await?;
        Ok(rows.into_iter().map(RecommendationCandidate::from).collect())
    }
}

#[async_trait]
impl AssignmentStore for PgStore {
    async fn find_active(
        &self,
        key: &AssignmentKey,
        now: Timestamp,
    ) -> Result<Option<AbAssignment>, StoreError> {
        Ok(AbAssignmentRepo::find_active(&self.pool, key, now).await?)
    }

    async fn find_or_create(
        &self,
        key: &AssignmentKey,
        variant_group_id: &str,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<(AbAssignment, bool), StoreError> {
        Ok(
            AbAssignmentRepo::find_or_create(&self.pool, key, variant_group_id, expires_at, now)
                .await?,
        )
    }
}

#[async_trait]
impl EventLog for PgStore {
    async fn facts(
        &self,
        shop: &str,
        product_id: Option<&str>,
    ) -> Result<Vec<EventFact>, StoreError> {
        Ok(AnalyticsEventRepo::list_facts(&self.pool, shop, product_id).await?)
    }
}
