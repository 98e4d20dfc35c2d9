use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use bundlewise_core::bundle::DiscountDraft;
use bundlewise_core::types::{RemoteId, Timestamp};
use tokio::sync::RwLock;

use super::injected;
use crate::error::RemoteError;
use crate::store::DiscountStore;

/// A discount as held by [`MockDiscountStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockDiscount {
    pub shop: String,
    pub title: String,
    pub percent: f64,
    pub product_ids: Vec<String>,
    pub starts_at: Timestamp,
    pub ends_at: Option<Timestamp>,
}

impl MockDiscount {
    /// Whether the discount applies at `now`.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.starts_at <= now && self.ends_at.map_or(true, |end| end > now)
    }
}

/// Mock automatic-discount store keyed by discount id.
#[derive(Default)]
pub struct MockDiscountStore {
    discounts: RwLock<HashMap<String, MockDiscount>>,
    next_id: AtomicU64,
    delete_calls: AtomicUsize,
    fail_on_create: RwLock<bool>,
    fail_on_update: RwLock<bool>,
    fail_on_delete: RwLock<bool>,
    fail_on_toggle: RwLock<bool>,
}

impl MockDiscountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_create(&self, fail: bool) {
        *self.fail_on_create.write().await = fail;
    }

    pub async fn set_fail_on_update(&self, fail: bool) {
        *self.fail_on_update.write().await = fail;
    }

    pub async fn set_fail_on_delete(&self, fail: bool) {
        *self.fail_on_delete.write().await = fail;
    }

    pub async fn set_fail_on_toggle(&self, fail: bool) {
        *self.fail_on_toggle.write().await = fail;
    }

    pub async fn get(&self, id: &str) -> Option<MockDiscount> {
        self.discounts.read().await.get(id).cloned()
    }

    pub async fn count(&self, shop: &str) -> usize {
        self.discounts
            .read()
            .await
            .values()
            .filter(|d| d.shop == shop)
            .count()
    }

    /// Number of delete calls that reached the store, successful or not.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn next_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("gid://shopify/DiscountAutomaticNode/{n}")
    }

    fn not_found(id: &str) -> RemoteError {
        RemoteError::NotFound {
            kind: "discount",
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl DiscountStore for MockDiscountStore {
    async fn create(&self, shop: &str, draft: &DiscountDraft) -> Result<RemoteId, RemoteError> {
        if *self.fail_on_create.read().await {
            return Err(injected("discount create"));
        }
        let id = self.next_id();
        self.discounts.write().await.insert(
            id.clone(),
            MockDiscount {
                shop: shop.to_string(),
                title: draft.title.clone(),
                percent: draft.percent,
                product_ids: draft.product_ids.clone(),
                starts_at: draft.starts_at,
                ends_at: draft.ends_at,
            },
        );
        Ok(id)
    }

    async fn update_percentage(
        &self,
        _shop: &str,
        id: &str,
        percent: f64,
    ) -> Result<(), RemoteError> {
        if *self.fail_on_update.read().await {
            return Err(injected("discount update"));
        }
        let mut discounts = self.discounts.write().await;
        let discount = discounts.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        discount.percent = percent;
        Ok(())
    }

    async fn delete(&self, _shop: &str, id: &str) -> Result<(), RemoteError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_on_delete.read().await {
            return Err(injected("discount delete"));
        }
        self.discounts
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn toggle(
        &self,
        _shop: &str,
        id: &str,
        active: bool,
        now: Timestamp,
    ) -> Result<(), RemoteError> {
        if *self.fail_on_toggle.read().await {
            return Err(injected("discount toggle"));
        }
        let mut discounts = self.discounts.write().await;
        let discount = discounts.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        if active {
            discount.starts_at = now;
            discount.ends_at = None;
        } else {
            discount.ends_at = Some(now);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn draft() -> DiscountDraft {
        DiscountDraft {
            title: "Bundle discount: pair".into(),
            percent: 10.0,
            product_ids: vec!["p1".into(), "p2".into()],
            starts_at: Utc::now() - Duration::seconds(1),
            ends_at: None,
        }
    }

    #[tokio::test]
    async fn toggle_moves_schedule() {
        let store = MockDiscountStore::new();
        let id = store.create("shop", &draft()).await.unwrap();

        let off_at = Utc::now();
        store.toggle("shop", &id, false, off_at).await.unwrap();
        let off = store.get(&id).await.unwrap();
        assert!(!off.is_active_at(off_at + Duration::seconds(1)));

        let on_at = off_at + Duration::seconds(5);
        store.toggle("shop", &id, true, on_at).await.unwrap();
        let on = store.get(&id).await.unwrap();
        assert_eq!(on.starts_at, on_at);
        assert!(on.is_active_at(on_at + Duration::seconds(1)));
    }

    #[tokio::test]
    async fn deleting_twice_reports_not_found() {
        let store = MockDiscountStore::new();
        let id = store.create("shop", &draft()).await.unwrap();
        store.delete("shop", &id).await.unwrap();
        let err = store.delete("shop", &id).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.delete_calls(), 2);
    }

    #[tokio::test]
    async fn injected_failure_leaves_state_untouched() {
        let store = MockDiscountStore::new();
        store.set_fail_on_create(true).await;
        assert!(store.create("shop", &draft()).await.is_err());
        assert_eq!(store.count("shop").await, 0);
    }
}
