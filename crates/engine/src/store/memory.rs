//! In-memory implementation of every store trait.
//!
//! Used by service tests and for running the engine without a database.
//! Assignment find-or-create holds one mutex across the check and the
//! insert, matching the advisory-lock transaction of the Postgres store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use bundlewise_core::ab_testing::RecommendationCandidate;
use bundlewise_core::analytics::variant_of;
use bundlewise_core::auto_bundle::NewRule;
use bundlewise_core::types::{DbId, Timestamp};
use bundlewise_db::models::ab_assignment::{AbAssignment, AssignmentKey};
use bundlewise_db::models::analytics_event::EventFact;
use bundlewise_db::models::auto_bundle_rule::AutoBundleRule;
use bundlewise_db::models::discount_link::{DiscountLink, UpsertDiscountLink};
use bundlewise_events::{EventSink, SinkError, StorefrontEvent};
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use super::{
    AssignmentStore, EventLog, LinkStore, RecommendationStore, RuleStore, StoreError,
};

/// A stored recommendation.
#[derive(Debug, Clone)]
struct StoredRecommendation {
    shop: String,
    candidate: RecommendationCandidate,
}

#[derive(Default)]
pub struct MemoryStore {
    next_id: AtomicI64,
    links: RwLock<HashMap<(String, String), DiscountLink>>,
    rules: RwLock<Vec<AutoBundleRule>>,
    recommendations: RwLock<Vec<StoredRecommendation>>,
    assignments: Mutex<Vec<AbAssignment>>,
    events: RwLock<Vec<StorefrontEvent>>,
    fail_on_link_upsert: RwLock<bool>,
    fail_on_link_update: RwLock<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_link_upsert(&self, fail: bool) {
        *self.fail_on_link_upsert.write().await = fail;
    }

    pub async fn set_fail_on_link_update(&self, fail: bool) {
        *self.fail_on_link_update.write().await = fail;
    }

    pub async fn add_recommendation(&self, shop: &str, candidate: RecommendationCandidate) {
        self.recommendations.write().await.push(StoredRecommendation {
            shop: shop.to_string(),
            candidate,
        });
    }

    pub async fn link_count(&self, shop: &str) -> usize {
        self.links
            .read()
            .await
            .keys()
            .filter(|(s, _)| s == shop)
            .count()
    }

    /// Rows ever written for `key`, expired ones included.
    pub async fn assignment_count(&self, key: &AssignmentKey) -> usize {
        self.assignments
            .lock()
            .await
            .iter()
            .filter(|r| matches_key(r, key))
            .count()
    }

    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    fn next_id(&self) -> DbId {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn unavailable(operation: &str) -> StoreError {
        StoreError::Unavailable(format!("injected {operation} failure"))
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

#[async_trait]
impl LinkStore for MemoryStore {
    async fn upsert(&self, link: &UpsertDiscountLink) -> Result<DiscountLink, StoreError> {
        if *self.fail_on_link_upsert.read().await {
            return Err(Self::unavailable("link upsert"));
        }
        let now = Utc::now();
        let mut links = self.links.write().await;
        let key = (link.shop.clone(), link.bundle_id.clone());
        let row = match links.get(&key) {
            Some(existing) => DiscountLink {
                discount_id: link.discount_id.clone(),
                discount_active: link.discount_active,
                bundle_name: link.bundle_name.clone(),
                updated_at: now,
                ..existing.clone()
            },
            None => DiscountLink {
                id: self.next_id(),
                bundle_id: link.bundle_id.clone(),
                discount_id: link.discount_id.clone(),
                discount_active: link.discount_active,
                bundle_name: link.bundle_name.clone(),
                shop: link.shop.clone(),
                created_at: now,
                updated_at: now,
            },
        };
        links.insert(key, row.clone());
        Ok(row)
    }

    async fn find(&self, shop: &str, bundle_id: &str) -> Result<Option<DiscountLink>, StoreError> {
        Ok(self
            .links
            .read()
            .await
            .get(&(shop.to_string(), bundle_id.to_string()))
            .cloned())
    }

    async fn set_discount_id(
        &self,
        shop: &str,
        bundle_id: &str,
        discount_id: Option<&str>,
    ) -> Result<Option<DiscountLink>, StoreError> {
        if *self.fail_on_link_update.read().await {
            return Err(Self::unavailable("link update"));
        }
        let mut links = self.links.write().await;
        Ok(links
            .get_mut(&(shop.to_string(), bundle_id.to_string()))
            .map(|link| {
                link.discount_id = discount_id.map(str::to_string);
                link.updated_at = Utc::now();
                link.clone()
            }))
    }

    async fn set_discount_active(
        &self,
        shop: &str,
        bundle_id: &str,
        active: bool,
    ) -> Result<Option<DiscountLink>, StoreError> {
        if *self.fail_on_link_update.read().await {
            return Err(Self::unavailable("link update"));
        }
        let mut links = self.links.write().await;
        Ok(links
            .get_mut(&(shop.to_string(), bundle_id.to_string()))
            .map(|link| {
                link.discount_active = active;
                link.updated_at = Utc::now();
                link.clone()
            }))
    }

    async fn delete(&self, shop: &str, bundle_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .links
            .write()
            .await
            .remove(&(shop.to_string(), bundle_id.to_string()))
            .is_some())
    }

    async fn list(&self, shop: &str) -> Result<Vec<DiscountLink>, StoreError> {
        let mut list: Vec<DiscountLink> = self
            .links
            .read()
            .await
            .values()
            .filter(|l| l.shop == shop)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.bundle_name.cmp(&b.bundle_name));
        Ok(list)
    }

    async fn shops(&self) -> Result<Vec<String>, StoreError> {
        let mut shops: Vec<String> = self
            .links
            .read()
            .await
            .keys()
            .map(|(shop, _)| shop.clone())
            .collect();
        shops.sort();
        shops.dedup();
        Ok(shops)
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[async_trait]
impl RuleStore for MemoryStore {
    async fn create(&self, shop: &str, input: &NewRule) -> Result<AutoBundleRule, StoreError> {
        let mut rules = self.rules.write().await;
        if rules.iter().any(|r| r.shop == shop && r.name == input.name) {
            return Err(StoreError::Conflict(format!(
                "A rule named '{}' already exists",
                input.name
            )));
        }
        let now = Utc::now();
        let rule = AutoBundleRule {
            id: self.next_id(),
            shop: shop.to_string(),
            name: input.name.clone(),
            collections: input.collections.clone(),
            tags: input.tags.clone(),
            min_price: input.min_price,
            max_price: input.max_price,
            min_products: input.min_products,
            discount_percent: input.discount_percent,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        rules.push(rule.clone());
        Ok(rule)
    }

    async fn get(&self, shop: &str, id: DbId) -> Result<Option<AutoBundleRule>, StoreError> {
        Ok(self
            .rules
            .read()
            .await
            .iter()
            .find(|r| r.shop == shop && r.id == id)
            .cloned())
    }

    async fn list(&self, shop: &str) -> Result<Vec<AutoBundleRule>, StoreError> {
        let mut list: Vec<AutoBundleRule> = self
            .rules
            .read()
            .await
            .iter()
            .filter(|r| r.shop == shop)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(list)
    }

    async fn list_active(&self, shop: &str) -> Result<Vec<AutoBundleRule>, StoreError> {
        Ok(self
            .rules
            .read()
            .await
            .iter()
            .filter(|r| r.shop == shop && r.is_active)
            .cloned()
            .collect())
    }

    async fn set_active(
        &self,
        shop: &str,
        id: DbId,
        is_active: bool,
    ) -> Result<Option<AutoBundleRule>, StoreError> {
        let mut rules = self.rules.write().await;
        Ok(rules
            .iter_mut()
            .find(|r| r.shop == shop && r.id == id)
            .map(|rule| {
                rule.is_active = is_active;
                rule.updated_at = Utc::now();
                rule.clone()
            }))
    }

    async fn delete(&self, shop: &str, id: DbId) -> Result<bool, StoreError> {
        let mut rules = self.rules.write().await;
        let before = rules.len();
        rules.retain(|r| !(r.shop == shop && r.id == id));
        Ok(rules.len() < before)
    }

    async fn shops(&self) -> Result<Vec<String>, StoreError> {
        let mut shops: Vec<String> = self
            .rules
            .read()
            .await
            .iter()
            .map(|r| r.shop.clone())
            .collect();
        shops.sort();
        shops.dedup();
        Ok(shops)
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

#[async_trait]
impl RecommendationStore for MemoryStore {
    async fn active_for_product(
        &self,
        shop: &str,
        product_id: &str,
    ) -> Result<Vec<RecommendationCandidate>, StoreError> {
        let mut list: Vec<RecommendationCandidate> = self
            .recommendations
            .read()
            .await
            .iter()
            .filter(|r| r.shop == shop && r.candidate.product_id == product_id)
            .filter(|r| r.candidate.is_active)
            .map(|r| r.candidate.clone())
            .collect();
        list.sort_by(|a, b| b.confidence_score.total_cmp(&a.confidence_score));
        Ok(list)
    }
}

// ---------------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------------

fn matches_key(row: &AbAssignment, key: &AssignmentKey) -> bool {
    row.shop == key.shop && row.session_id == key.session_id && row.product_id == key.product_id
}

fn live_assignment(
    rows: &[AbAssignment],
    key: &AssignmentKey,
    now: Timestamp,
) -> Option<AbAssignment> {
    rows.iter()
        .filter(|r| matches_key(r, key) && r.expires_at > now)
        .max_by_key(|r| r.expires_at)
        .cloned()
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn find_active(
        &self,
        key: &AssignmentKey,
        now: Timestamp,
    ) -> Result<Option<AbAssignment>, StoreError> {
        Ok(live_assignment(&self.assignments.lock().await, key, now))
    }

    async fn find_or_create(
        &self,
        key: &AssignmentKey,
        variant_group_id: &str,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<(AbAssignment, bool), StoreError> {
        let mut rows = self.assignments.lock().await;
        if let Some(existing) = live_assignment(&rows, key, now) {
            return Ok((existing, false));
        }
        let row = AbAssignment {
            id: self.next_id(),
            shop: key.shop.clone(),
            session_id: key.session_id.clone(),
            product_id: key.product_id.clone(),
            variant_group_id: variant_group_id.to_string(),
            expires_at,
            created_at: now,
        };
        rows.push(row.clone());
        Ok((row, true))
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[async_trait]
impl EventSink for MemoryStore {
    async fn append(&self, event: &StorefrontEvent) -> Result<(), SinkError> {
        self.events.write().await.push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl EventLog for MemoryStore {
    async fn facts(
        &self,
        shop: &str,
        product_id: Option<&str>,
    ) -> Result<Vec<EventFact>, StoreError> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.shop == shop)
            .filter(|e| product_id.map_or(true, |p| e.product_id == p))
            .map(|e| EventFact {
                event_type: e.event_type.as_str().to_string(),
                variant_group_id: variant_of(&e.metadata).map(str::to_string),
            })
            .collect())
    }
}
