//! Shared harness for engine tests: in-memory remote doubles and local
//! store wired into the services.

#![allow(dead_code)]

use std::sync::Arc;

use bundlewise_commerce::mock::{MockBundleStore, MockCatalog, MockDiscountStore};
use bundlewise_core::auto_bundle::CatalogProduct;
use bundlewise_core::bundle::{BundleComponent, NewBundle};
use bundlewise_engine::store::MemoryStore;
use bundlewise_engine::{DiscountSynchronizer, RuleEngine};

pub const SHOP: &str = "acme.myshopify.com";

pub struct Harness {
    pub bundles: Arc<MockBundleStore>,
    pub discounts: Arc<MockDiscountStore>,
    pub catalog: Arc<MockCatalog>,
    pub store: Arc<MemoryStore>,
    pub sync: Arc<DiscountSynchronizer>,
    pub rules: RuleEngine,
}

impl Harness {
    pub fn new() -> Self {
        let bundles = Arc::new(MockBundleStore::new());
        let discounts = Arc::new(MockDiscountStore::new());
        let catalog = Arc::new(MockCatalog::new());
        let store = Arc::new(MemoryStore::new());
        let sync = Arc::new(DiscountSynchronizer::new(
            bundles.clone(),
            discounts.clone(),
            store.clone(),
        ));
        let rules = RuleEngine::new(store.clone(), catalog.clone(), sync.clone());
        Self {
            bundles,
            discounts,
            catalog,
            store,
            sync,
            rules,
        }
    }
}

pub fn components(ids: &[&str]) -> Vec<BundleComponent> {
    ids.iter().map(|id| BundleComponent::new(*id, 1)).collect()
}

pub fn new_bundle(name: &str, product_ids: &[&str], percent: f64) -> NewBundle {
    NewBundle {
        name: name.to_string(),
        title: format!("Title of {name}"),
        description: None,
        discount_percent: percent,
        components: components(product_ids),
        status: Default::default(),
    }
}

pub fn product(id: &str, price: f64, tags: &[&str]) -> CatalogProduct {
    CatalogProduct {
        id: id.to_string(),
        title: format!("Product {id}"),
        price,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        collections: vec!["summer-collection".into()],
    }
}
