use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bundlewise_core::bundle::{Bundle, BundlePatch, NewBundle};
use chrono::Utc;
use tokio::sync::RwLock;

use super::injected;
use crate::error::RemoteError;
use crate::store::BundleStore;

/// Mock bundle store keyed by `(shop, id)`.
#[derive(Default)]
pub struct MockBundleStore {
    bundles: RwLock<HashMap<(String, String), Bundle>>,
    next_id: AtomicU64,
    fail_on_create: RwLock<bool>,
    fail_on_read: RwLock<bool>,
    fail_on_update: RwLock<bool>,
    fail_on_delete: RwLock<bool>,
}

impl MockBundleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_create(&self, fail: bool) {
        *self.fail_on_create.write().await = fail;
    }

    /// Fail `get`, `find_by_name` and `list`.
    pub async fn set_fail_on_read(&self, fail: bool) {
        *self.fail_on_read.write().await = fail;
    }

    pub async fn set_fail_on_update(&self, fail: bool) {
        *self.fail_on_update.write().await = fail;
    }

    pub async fn set_fail_on_delete(&self, fail: bool) {
        *self.fail_on_delete.write().await = fail;
    }

    /// Insert a bundle directly, bypassing the synchronizer.
    pub async fn insert(&self, bundle: Bundle) {
        self.bundles
            .write()
            .await
            .insert((bundle.shop.clone(), bundle.id.clone()), bundle);
    }

    pub async fn count(&self, shop: &str) -> usize {
        self.bundles
            .read()
            .await
            .keys()
            .filter(|(s, _)| s == shop)
            .count()
    }

    pub async fn contains(&self, shop: &str, id: &str) -> bool {
        self.bundles
            .read()
            .await
            .contains_key(&(shop.to_string(), id.to_string()))
    }

    /// Names of every stored bundle of a shop, sorted.
    pub async fn names(&self, shop: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .bundles
            .read()
            .await
            .values()
            .filter(|b| b.shop == shop)
            .map(|b| b.name.clone())
            .collect();
        names.sort();
        names
    }

    fn next_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("gid://shopify/Metaobject/{n}")
    }
}

#[async_trait]
impl BundleStore for MockBundleStore {
    async fn create(&self, shop: &str, input: &NewBundle) -> Result<Bundle, RemoteError> {
        if *self.fail_on_create.read().await {
            return Err(injected("bundle create"));
        }
        let mut bundles = self.bundles.write().await;
        if bundles
            .values()
            .any(|b| b.shop == shop && b.name == input.name)
        {
            return Err(RemoteError::UserErrors(vec![format!(
                "handle: '{}' has already been taken",
                input.name
            )]));
        }

        let now = Utc::now();
        let bundle = Bundle {
            id: self.next_id(),
            shop: shop.to_string(),
            name: input.name.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            discount_percent: input.discount_percent,
            components: input.components.clone(),
            status: input.status,
            created_at: now,
            updated_at: now,
        };
        bundles.insert((shop.to_string(), bundle.id.clone()), bundle.clone());
        Ok(bundle)
    }

    async fn get(&self, shop: &str, id: &str) -> Result<Option<Bundle>, RemoteError> {
        if *self.fail_on_read.read().await {
            return Err(injected("bundle read"));
        }
        Ok(self
            .bundles
            .read()
            .await
            .get(&(shop.to_string(), id.to_string()))
            .cloned())
    }

    async fn find_by_name(&self, shop: &str, name: &str) -> Result<Option<Bundle>, RemoteError> {
        if *self.fail_on_read.read().await {
            return Err(injected("bundle read"));
        }
        Ok(self
            .bundles
            .read()
            .await
            .values()
            .find(|b| b.shop == shop && b.name == name)
            .cloned())
    }

    async fn list(&self, shop: &str) -> Result<Vec<Bundle>, RemoteError> {
        if *self.fail_on_read.read().await {
            return Err(injected("bundle list"));
        }
        let mut list: Vec<Bundle> = self
            .bundles
            .read()
            .await
            .values()
            .filter(|b| b.shop == shop)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn update(
        &self,
        shop: &str,
        id: &str,
        patch: &BundlePatch,
    ) -> Result<Bundle, RemoteError> {
        if *self.fail_on_update.read().await {
            return Err(injected("bundle update"));
        }
        let mut bundles = self.bundles.write().await;
        let bundle = bundles
            .get_mut(&(shop.to_string(), id.to_string()))
            .ok_or_else(|| RemoteError::NotFound {
                kind: "bundle",
                id: id.to_string(),
            })?;
        bundle.apply_patch(patch, Utc::now());
        Ok(bundle.clone())
    }

    async fn delete(&self, shop: &str, id: &str) -> Result<(), RemoteError> {
        if *self.fail_on_delete.read().await {
            return Err(injected("bundle delete"));
        }
        self.bundles
            .write()
            .await
            .remove(&(shop.to_string(), id.to_string()))
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound {
                kind: "bundle",
                id: id.to_string(),
            })
    }
}
