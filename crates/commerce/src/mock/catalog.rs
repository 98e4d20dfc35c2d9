use std::collections::HashMap;

use async_trait::async_trait;
use bundlewise_core::auto_bundle::CatalogProduct;
use tokio::sync::RwLock;

use super::injected;
use crate::error::RemoteError;
use crate::store::ProductCatalog;

/// Mock product catalog holding a fixed product list per shop.
#[derive(Default)]
pub struct MockCatalog {
    products: RwLock<HashMap<String, Vec<CatalogProduct>>>,
    fail_on_list: RwLock<bool>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_products(&self, shop: &str, products: Vec<CatalogProduct>) {
        self.products
            .write()
            .await
            .insert(shop.to_string(), products);
    }

    pub async fn set_fail_on_list(&self, fail: bool) {
        *self.fail_on_list.write().await = fail;
    }
}

#[async_trait]
impl ProductCatalog for MockCatalog {
    async fn list_products(&self, shop: &str) -> Result<Vec<CatalogProduct>, RemoteError> {
        if *self.fail_on_list.read().await {
            return Err(injected("product list"));
        }
        Ok(self
            .products
            .read()
            .await
            .get(shop)
            .cloned()
            .unwrap_or_default())
    }
}
