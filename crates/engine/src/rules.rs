//! Auto-bundle rule engine.
//!
//! Each rule owns at most one generated bundle, found by the deterministic
//! name [`generated_bundle_name`]. Activation reuses that bundle when it
//! exists, so toggling a rule on and off never multiplies discounts.
//! Deactivation only ends the discount's schedule.

use std::sync::Arc;

use bundlewise_commerce::ProductCatalog;
use bundlewise_core::auto_bundle::{
    bundle_for_rule, generated_bundle_name, select_candidates, validate_rule, NewRule,
};
use bundlewise_core::bundle::ImportReport;
use bundlewise_core::error::{CoreError, RemoteResource};
use bundlewise_core::types::DbId;
use bundlewise_db::models::auto_bundle_rule::AutoBundleRule;

use crate::locks::KeyedLocks;
use crate::store::RuleStore;
use crate::synchronizer::{BundleView, DiscountSynchronizer};

pub struct RuleEngine {
    rules: Arc<dyn RuleStore>,
    catalog: Arc<dyn ProductCatalog>,
    sync: Arc<DiscountSynchronizer>,
    locks: KeyedLocks,
}

impl RuleEngine {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        catalog: Arc<dyn ProductCatalog>,
        sync: Arc<DiscountSynchronizer>,
    ) -> Self {
        Self {
            rules,
            catalog,
            sync,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn list_rules(&self, shop: &str) -> Result<Vec<AutoBundleRule>, CoreError> {
        Ok(self.rules.list(shop).await?)
    }

    /// Shops with at least one rule.
    pub async fn known_shops(&self) -> Result<Vec<String>, CoreError> {
        Ok(self.rules.shops().await?)
    }

    pub async fn get_rule(&self, shop: &str, id: DbId) -> Result<AutoBundleRule, CoreError> {
        self.rules
            .get(shop, id)
            .await?
            .ok_or_else(|| CoreError::not_found("AutoBundleRule", id))
    }

    /// Store a rule and, if it starts active, generate its bundle.
    ///
    /// When generation fails the rule is kept but stored inactive, and the
    /// generation error is returned.
    pub async fn create_rule(&self, shop: &str, input: &NewRule) -> Result<AutoBundleRule, CoreError> {
        validate_rule(input)?;
        let rule = self.rules.create(shop, input).await?;
        tracing::info!(shop, rule_id = rule.id, name = %rule.name, active = rule.is_active, "Rule created");

        if !rule.is_active {
            return Ok(rule);
        }

        let _guard = self.locks.lock(&rule_key(shop, rule.id)).await;
        if let Err(e) = self.activate(shop, &rule).await {
            tracing::warn!(shop, rule_id = rule.id, error = %e, "Rule activation failed, storing inactive");
            if let Err(store_err) = self.rules.set_active(shop, rule.id, false).await {
                tracing::error!(shop, rule_id = rule.id, error = %store_err, "Could not mark rule inactive");
            }
            return Err(e);
        }
        Ok(rule)
    }

    /// Switch a rule on or off.
    pub async fn toggle_rule(
        &self,
        shop: &str,
        id: DbId,
        active: bool,
    ) -> Result<AutoBundleRule, CoreError> {
        let _guard = self.locks.lock(&rule_key(shop, id)).await;
        let rule = self.get_rule(shop, id).await?;

        if active {
            self.activate(shop, &rule).await?;
        } else {
            self.deactivate(shop, &rule).await?;
        }

        self.rules
            .set_active(shop, id, active)
            .await?
            .ok_or_else(|| CoreError::not_found("AutoBundleRule", id))
    }

    /// Delete a rule together with its generated bundle.
    ///
    /// A missing bundle or link is logged and does not block removal of the
    /// rule row. A remote failure while deleting the bundle aborts so the
    /// bundle is not left without an owner.
    pub async fn delete_rule(&self, shop: &str, id: DbId) -> Result<(), CoreError> {
        let _guard = self.locks.lock(&rule_key(shop, id)).await;
        let rule = self.get_rule(shop, id).await?;
        let name = generated_bundle_name(rule.id);

        match self.sync.find_by_name(shop, &name).await? {
            Some(bundle) => match self.sync.delete_bundle(shop, &bundle.id).await {
                Ok(()) => {}
                Err(CoreError::NotFound { .. }) => {
                    tracing::warn!(shop, rule_id = id, bundle_id = %bundle.id, "Generated bundle already gone");
                }
                Err(e) => return Err(e),
            },
            None => {
                tracing::warn!(shop, rule_id = id, bundle = %name, "Rule has no generated bundle");
            }
        }

        self.rules.delete(shop, id).await?;
        tracing::info!(shop, rule_id = id, "Rule deleted");
        Ok(())
    }

    /// Re-drive generation for every active rule of a shop. Each rule
    /// succeeds or fails on its own.
    pub async fn sync_rules(&self, shop: &str) -> Result<ImportReport, CoreError> {
        let rules = self.rules.list_active(shop).await?;
        let mut report = ImportReport::default();
        for rule in rules {
            let _guard = self.locks.lock(&rule_key(shop, rule.id)).await;
            match self.activate(shop, &rule).await {
                Ok(_) => report.record_success(rule.name),
                Err(e) => {
                    tracing::warn!(shop, rule_id = rule.id, error = %e, "Rule sync failed");
                    report.record_failure(rule.name, e);
                }
            }
        }
        Ok(report)
    }

    // ---- state transitions ----

    async fn activate(&self, shop: &str, rule: &AutoBundleRule) -> Result<BundleView, CoreError> {
        let name = generated_bundle_name(rule.id);
        if let Some(bundle) = self.sync.find_by_name(shop, &name).await? {
            tracing::debug!(shop, rule_id = rule.id, bundle_id = %bundle.id, "Reusing generated bundle");
            return self.sync.enable_discount(shop, bundle).await;
        }

        let products = self
            .catalog
            .list_products(shop)
            .await
            .map_err(|e| CoreError::RemoteRead {
                resource: RemoteResource::Product,
                message: e.to_string(),
            })?;
        let candidates = select_candidates(&rule.criteria(), &products)?;
        let input = bundle_for_rule(rule.id, &rule.name, rule.discount_percent, &candidates);

        let view = self.sync.create_bundle(shop, &input).await?;
        tracing::info!(
            shop,
            rule_id = rule.id,
            bundle_id = %view.bundle.id,
            products = candidates.len(),
            "Generated bundle for rule"
        );
        Ok(view)
    }

    async fn deactivate(&self, shop: &str, rule: &AutoBundleRule) -> Result<(), CoreError> {
        let name = generated_bundle_name(rule.id);
        match self.sync.find_by_name(shop, &name).await? {
            Some(bundle) => self.sync.disable_discount(shop, &bundle.id).await,
            None => {
                tracing::warn!(shop, rule_id = rule.id, bundle = %name, "No generated bundle to disable");
                Ok(())
            }
        }
    }
}

fn rule_key(shop: &str, id: DbId) -> String {
    format!("{shop}/rule/{id}")
}
