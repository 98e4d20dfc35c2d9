//! Discount synchronizer.
//!
//! Every remote bundle is paired with exactly one remote automatic discount,
//! recorded locally as a [`DiscountLink`]. The remote calls are not
//! transactional with each other, so each multi-step operation is a saga:
//! a failed step triggers compensating deletes of whatever the earlier
//! steps created, and a failed compensation escalates to
//! [`CoreError::Consistency`] carrying the ids needed to clean up.
//!
//! Update and delete of the same bundle are serialized with a per-bundle
//! lock. Creates need none because the bundle id does not exist yet.

use std::collections::HashMap;
use std::sync::Arc;

use bundlewise_commerce::{BundleStore, DiscountStore, RemoteError};
use bundlewise_core::bundle::{
    discount_for, validate_import_count, validate_new_bundle, validate_patch, Bundle,
    BundlePatch, BundleStatus, DiscountDraft, ImportReport, NewBundle,
};
use bundlewise_core::error::{CoreError, RemoteResource};
use bundlewise_core::types::{RemoteId, Timestamp};
use bundlewise_db::models::discount_link::{DiscountLink, UpsertDiscountLink};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::locks::KeyedLocks;
use crate::store::LinkStore;

/// Bundles created concurrently by one import.
pub const IMPORT_CONCURRENCY: usize = 4;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A bundle together with the discount currently linked to it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleView {
    #[serde(flatten)]
    pub bundle: Bundle,
    /// `None` when no link exists or the link is pending.
    pub discount_id: Option<RemoteId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrphanReason {
    /// No link row exists for the bundle.
    MissingLink,
    /// The link exists but its discount was removed and not yet replaced.
    PendingDiscount,
}

/// An active bundle that is not backed by a live discount.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanedBundle {
    pub bundle_id: RemoteId,
    pub name: String,
    pub reason: OrphanReason,
}

// ---------------------------------------------------------------------------
// Error helpers
// ---------------------------------------------------------------------------

fn remote_read(resource: RemoteResource, err: &RemoteError) -> CoreError {
    CoreError::RemoteRead {
        resource,
        message: err.to_string(),
    }
}

fn remote_create(resource: RemoteResource, err: &RemoteError) -> CoreError {
    CoreError::RemoteCreate {
        resource,
        message: err.to_string(),
    }
}

fn remote_update(resource: RemoteResource, id: &str, err: &RemoteError) -> CoreError {
    if resource == RemoteResource::Bundle && err.is_not_found() {
        return CoreError::not_found("Bundle", id);
    }
    CoreError::RemoteUpdate {
        resource,
        id: id.to_string(),
        message: err.to_string(),
    }
}

fn remote_delete(resource: RemoteResource, id: &str, err: &RemoteError) -> CoreError {
    CoreError::RemoteDelete {
        resource,
        id: id.to_string(),
        message: err.to_string(),
    }
}

fn lock_key(shop: &str, bundle_id: &str) -> String {
    format!("{shop}/{bundle_id}")
}

/// The discount `bundle` should carry, ended at `now` when switched off.
fn draft_for(bundle: &Bundle, active: bool, now: Timestamp) -> DiscountDraft {
    let draft = discount_for(&bundle.name, bundle.discount_percent, &bundle.components, now);
    if active {
        draft
    } else {
        draft.ended(now)
    }
}

// ---------------------------------------------------------------------------
// Synchronizer
// ---------------------------------------------------------------------------

pub struct DiscountSynchronizer {
    bundles: Arc<dyn BundleStore>,
    discounts: Arc<dyn DiscountStore>,
    links: Arc<dyn LinkStore>,
    locks: KeyedLocks,
}

impl DiscountSynchronizer {
    pub fn new(
        bundles: Arc<dyn BundleStore>,
        discounts: Arc<dyn DiscountStore>,
        links: Arc<dyn LinkStore>,
    ) -> Self {
        Self {
            bundles,
            discounts,
            links,
            locks: KeyedLocks::new(),
        }
    }

    // ---- create ----

    /// Create a bundle, its discount and the link between them.
    ///
    /// Input is validated before any remote call. If the discount cannot be
    /// created the bundle is deleted again; if the link cannot be stored
    /// both remote objects are deleted.
    pub async fn create_bundle(&self, shop: &str, input: &NewBundle) -> Result<BundleView, CoreError> {
        validate_new_bundle(input)?;

        let bundle = self
            .bundles
            .create(shop, input)
            .await
            .map_err(|e| remote_create(RemoteResource::Bundle, &e))?;
        tracing::info!(shop, bundle_id = %bundle.id, name = %bundle.name, "Remote bundle created");

        let draft = discount_for(&bundle.name, input.discount_percent, &input.components, Utc::now());
        let discount_id = match self.discounts.create(shop, &draft).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(shop, bundle_id = %bundle.id, error = %e, "Discount create failed, rolling back bundle");
                if let Err(rollback) = self.delete_remote_bundle(shop, &bundle.id).await {
                    tracing::error!(shop, bundle_id = %bundle.id, error = %rollback, "Bundle rollback failed");
                    return Err(CoreError::Consistency {
                        bundle_id: Some(bundle.id),
                        discount_id: None,
                        message: format!(
                            "discount create failed ({e}) and bundle rollback failed ({rollback})"
                        ),
                    });
                }
                return Err(remote_create(RemoteResource::Discount, &e));
            }
        };
        tracing::info!(shop, bundle_id = %bundle.id, discount_id = %discount_id, "Remote discount created");

        let link = UpsertDiscountLink {
            bundle_id: bundle.id.clone(),
            discount_id: Some(discount_id.clone()),
            discount_active: true,
            bundle_name: bundle.name.clone(),
            shop: shop.to_string(),
        };
        if let Err(e) = self.links.upsert(&link).await {
            tracing::warn!(
                shop,
                bundle_id = %bundle.id,
                discount_id = %discount_id,
                error = %e,
                "Link write failed, rolling back remote objects"
            );
            let discount_rollback = self.delete_remote_discount(shop, &discount_id).await;
            let bundle_rollback = self.delete_remote_bundle(shop, &bundle.id).await;
            return match (discount_rollback, bundle_rollback) {
                (Ok(()), Ok(())) => Err(CoreError::Storage(format!(
                    "Failed to record discount link for bundle {}: {e}; remote objects rolled back",
                    bundle.id
                ))),
                (discount_rollback, bundle_rollback) => {
                    let failures: Vec<String> = [discount_rollback.err(), bundle_rollback.err()]
                        .into_iter()
                        .flatten()
                        .map(|err| err.to_string())
                        .collect();
                    tracing::error!(
                        shop,
                        bundle_id = %bundle.id,
                        discount_id = %discount_id,
                        "Rollback after link failure did not complete"
                    );
                    Err(CoreError::Consistency {
                        bundle_id: Some(bundle.id),
                        discount_id: Some(discount_id),
                        message: format!(
                            "link write failed ({e}) and rollback failed ({})",
                            failures.join("; ")
                        ),
                    })
                }
            };
        }

        Ok(BundleView {
            bundle,
            discount_id: Some(discount_id),
        })
    }

    /// Create every bundle independently. One failure never stops the rest;
    /// results keep the input order.
    pub async fn import_bundles(
        &self,
        shop: &str,
        inputs: Vec<NewBundle>,
    ) -> Result<ImportReport, CoreError> {
        validate_import_count(inputs.len())?;

        let outcomes: Vec<(String, Result<BundleView, CoreError>)> = stream::iter(inputs)
            .map(|input| async move {
                let result = self.create_bundle(shop, &input).await;
                (input.name, result)
            })
            .buffered(IMPORT_CONCURRENCY)
            .collect()
            .await;

        let mut report = ImportReport::default();
        for (name, result) in outcomes {
            match result {
                Ok(_) => report.record_success(name),
                Err(e) => {
                    tracing::warn!(shop, name = %name, error = %e, "Bundle import item failed");
                    report.record_failure(name, e);
                }
            }
        }
        tracing::info!(
            shop,
            succeeded = report.success.len(),
            failed = report.failed.len(),
            "Bundle import finished"
        );
        Ok(report)
    }

    // ---- update ----

    /// Update a bundle and keep its discount in line.
    ///
    /// Without a component change the bundle's percentage is written to the
    /// linked discount in place, which also detects a discount that has
    /// disappeared. With one, the old discount is deleted and the link
    /// marked pending before the new one is created, so two discounts never
    /// stack on the same products. Any failure after the delete leaves the
    /// link pending and the error is retryable.
    pub async fn update_bundle(
        &self,
        shop: &str,
        bundle_id: &str,
        patch: &BundlePatch,
    ) -> Result<BundleView, CoreError> {
        validate_patch(patch)?;
        let _guard = self.locks.lock(&lock_key(shop, bundle_id)).await;

        let link = self
            .links
            .find(shop, bundle_id)
            .await?
            .ok_or_else(|| CoreError::not_found("DiscountLink", bundle_id))?;

        let bundle = self
            .bundles
            .update(shop, bundle_id, patch)
            .await
            .map_err(|e| remote_update(RemoteResource::Bundle, bundle_id, &e))?;
        tracing::info!(shop, bundle_id, "Remote bundle updated");

        let discount_id = match link.discount_id.as_deref() {
            Some(existing) if !patch.touches_components() => {
                self.update_percentage(shop, &bundle, &link, existing).await?
            }
            _ => self.replace_discount(shop, &bundle, &link).await?,
        };

        Ok(BundleView {
            bundle,
            discount_id: Some(discount_id),
        })
    }

    async fn update_percentage(
        &self,
        shop: &str,
        bundle: &Bundle,
        link: &DiscountLink,
        discount_id: &str,
    ) -> Result<RemoteId, CoreError> {
        let percent = bundle.discount_percent;
        match self
            .discounts
            .update_percentage(shop, discount_id, percent)
            .await
        {
            Ok(()) => {
                tracing::info!(shop, bundle_id = %bundle.id, discount_id, percent, "Discount percentage updated");
                Ok(discount_id.to_string())
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    shop,
                    bundle_id = %bundle.id,
                    discount_id,
                    "Linked discount no longer exists, recreating"
                );
                self.replace_discount(shop, bundle, link).await
            }
            Err(e) => Err(remote_update(RemoteResource::Discount, discount_id, &e)),
        }
    }

    /// Delete the linked discount (if any), create one matching `bundle`
    /// and point the link at it. The new discount keeps the old one's
    /// on/off state.
    ///
    /// The link is pending whenever no discount exists for it, so a retry
    /// never deletes twice and never stacks two discounts.
    async fn replace_discount(
        &self,
        shop: &str,
        bundle: &Bundle,
        link: &DiscountLink,
    ) -> Result<RemoteId, CoreError> {
        if let Some(old) = link.discount_id.as_deref() {
            self.delete_remote_discount(shop, old)
                .await
                .map_err(|e| remote_delete(RemoteResource::Discount, old, &e))?;
            tracing::info!(shop, bundle_id = %bundle.id, discount_id = old, "Old discount deleted");

            match self.links.set_discount_id(shop, &bundle.id, None).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    return Err(CoreError::PartialUpdate {
                        bundle_id: bundle.id.clone(),
                        message: "old discount deleted but the link row disappeared".into(),
                    })
                }
                Err(e) => {
                    tracing::error!(shop, bundle_id = %bundle.id, error = %e, "Could not mark link pending");
                    return Err(CoreError::PartialUpdate {
                        bundle_id: bundle.id.clone(),
                        message: format!("old discount deleted but link could not be marked pending: {e}"),
                    });
                }
            }
        }

        let draft = draft_for(bundle, link.discount_active, Utc::now());
        let new_id = self.discounts.create(shop, &draft).await.map_err(|e| {
            tracing::error!(shop, bundle_id = %bundle.id, error = %e, "Replacement discount create failed");
            CoreError::PartialUpdate {
                bundle_id: bundle.id.clone(),
                message: format!("bundle has no active discount, replacement create failed: {e}"),
            }
        })?;

        let stored = self
            .links
            .set_discount_id(shop, &bundle.id, Some(&new_id))
            .await;
        let failure = match stored {
            Ok(Some(_)) => {
                tracing::info!(shop, bundle_id = %bundle.id, discount_id = %new_id, "Discount replaced");
                return Ok(new_id);
            }
            Ok(None) => "link row disappeared".to_string(),
            Err(e) => e.to_string(),
        };

        match self.delete_remote_discount(shop, &new_id).await {
            Ok(()) => Err(CoreError::PartialUpdate {
                bundle_id: bundle.id.clone(),
                message: format!("could not record replacement discount: {failure}"),
            }),
            Err(rollback) => {
                tracing::error!(
                    shop,
                    bundle_id = %bundle.id,
                    discount_id = %new_id,
                    error = %rollback,
                    "Replacement discount is untracked"
                );
                Err(CoreError::Consistency {
                    bundle_id: Some(bundle.id.clone()),
                    discount_id: Some(new_id),
                    message: format!(
                        "link update failed ({failure}) and discount rollback failed ({rollback})"
                    ),
                })
            }
        }
    }

    // ---- delete ----

    /// Delete a bundle's discount, its link and the bundle itself.
    ///
    /// A missing link is logged and does not stop the remote bundle from
    /// being deleted. Objects already gone remotely count as deleted.
    pub async fn delete_bundle(&self, shop: &str, bundle_id: &str) -> Result<(), CoreError> {
        let _guard = self.locks.lock(&lock_key(shop, bundle_id)).await;

        let link = self.links.find(shop, bundle_id).await?;
        match link.as_ref().and_then(|l| l.discount_id.as_deref()) {
            Some(discount_id) => {
                self.delete_remote_discount(shop, discount_id)
                    .await
                    .map_err(|e| remote_delete(RemoteResource::Discount, discount_id, &e))?;
                tracing::info!(shop, bundle_id, discount_id, "Discount deleted");
            }
            None if link.is_some() => {
                tracing::warn!(shop, bundle_id, "Link is pending, no discount to delete");
            }
            None => {
                let orphan = CoreError::OrphanedRecord {
                    bundle_id: bundle_id.to_string(),
                };
                tracing::warn!(shop, error = %orphan, "Continuing delete without discount");
            }
        }

        if link.is_some() {
            self.links.delete(shop, bundle_id).await?;
        }

        match self.bundles.delete(shop, bundle_id).await {
            Ok(()) => {
                tracing::info!(shop, bundle_id, "Remote bundle deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() && link.is_some() => {
                tracing::warn!(shop, bundle_id, "Remote bundle was already gone");
                Ok(())
            }
            Err(e) if e.is_not_found() => Err(CoreError::not_found("Bundle", bundle_id)),
            Err(e) => Err(remote_delete(RemoteResource::Bundle, bundle_id, &e)),
        }
    }

    // ---- reads ----

    pub async fn get_bundle(&self, shop: &str, bundle_id: &str) -> Result<BundleView, CoreError> {
        let bundle = self
            .bundles
            .get(shop, bundle_id)
            .await
            .map_err(|e| remote_read(RemoteResource::Bundle, &e))?
            .ok_or_else(|| CoreError::not_found("Bundle", bundle_id))?;
        let link = self.links.find(shop, bundle_id).await?;
        Ok(BundleView {
            bundle,
            discount_id: link.and_then(|l| l.discount_id),
        })
    }

    pub async fn list_bundles(&self, shop: &str) -> Result<Vec<BundleView>, CoreError> {
        let bundles = self
            .bundles
            .list(shop)
            .await
            .map_err(|e| remote_read(RemoteResource::Bundle, &e))?;
        let mut links = self.links_by_bundle(shop).await?;
        Ok(bundles
            .into_iter()
            .map(|bundle| {
                let discount_id = links.remove(&bundle.id).and_then(|l| l.discount_id);
                BundleView {
                    bundle,
                    discount_id,
                }
            })
            .collect())
    }

    /// Active bundles that are not backed by a live discount.
    pub async fn find_orphaned_bundles(&self, shop: &str) -> Result<Vec<OrphanedBundle>, CoreError> {
        let bundles = self
            .bundles
            .list(shop)
            .await
            .map_err(|e| remote_read(RemoteResource::Bundle, &e))?;
        let links = self.links_by_bundle(shop).await?;

        Ok(bundles
            .into_iter()
            .filter(|b| b.status == BundleStatus::Active)
            .filter_map(|b| {
                let reason = match links.get(&b.id) {
                    None => OrphanReason::MissingLink,
                    Some(link) if link.is_pending() => OrphanReason::PendingDiscount,
                    Some(_) => return None,
                };
                Some(OrphanedBundle {
                    bundle_id: b.id,
                    name: b.name,
                    reason,
                })
            })
            .collect())
    }

    /// Shops with at least one linked bundle.
    pub async fn known_shops(&self) -> Result<Vec<String>, CoreError> {
        Ok(self.links.shops().await?)
    }

    pub async fn find_by_name(&self, shop: &str, name: &str) -> Result<Option<Bundle>, CoreError> {
        self.bundles
            .find_by_name(shop, name)
            .await
            .map_err(|e| remote_read(RemoteResource::Bundle, &e))
    }

    // ---- discount switching ----

    /// Switch on the discount of an existing bundle.
    ///
    /// A live discount is re-enabled through its schedule. A bundle without
    /// one (missing or pending link, or a link to a deleted discount) gets a
    /// fresh discount and link.
    pub async fn enable_discount(&self, shop: &str, bundle: Bundle) -> Result<BundleView, CoreError> {
        let _guard = self.locks.lock(&lock_key(shop, &bundle.id)).await;

        let link = self.links.find(shop, &bundle.id).await?;
        if let Some(discount_id) = link.and_then(|l| l.discount_id) {
            match self
                .discounts
                .toggle(shop, &discount_id, true, Utc::now())
                .await
            {
                Ok(()) => {
                    self.links
                        .set_discount_active(shop, &bundle.id, true)
                        .await?;
                    tracing::info!(shop, bundle_id = %bundle.id, discount_id = %discount_id, "Discount enabled");
                    return Ok(BundleView {
                        bundle,
                        discount_id: Some(discount_id),
                    });
                }
                Err(e) if e.is_not_found() => {
                    tracing::warn!(shop, bundle_id = %bundle.id, discount_id = %discount_id, "Linked discount missing, recreating");
                }
                Err(e) => return Err(remote_update(RemoteResource::Discount, &discount_id, &e)),
            }
        }

        let discount_id = self.attach_discount(shop, &bundle).await?;
        Ok(BundleView {
            bundle,
            discount_id: Some(discount_id),
        })
    }

    /// Switch off a bundle's discount without deleting it.
    ///
    /// The off state is also recorded on the link, so a discount recreated
    /// later for the same bundle starts switched off.
    pub async fn disable_discount(&self, shop: &str, bundle_id: &str) -> Result<(), CoreError> {
        let _guard = self.locks.lock(&lock_key(shop, bundle_id)).await;

        let Some(link) = self.links.find(shop, bundle_id).await? else {
            let orphan = CoreError::OrphanedRecord {
                bundle_id: bundle_id.to_string(),
            };
            tracing::warn!(shop, error = %orphan, "Nothing to disable");
            return Ok(());
        };

        if let Some(discount_id) = link.discount_id.as_deref() {
            match self
                .discounts
                .toggle(shop, discount_id, false, Utc::now())
                .await
            {
                Ok(()) => {
                    tracing::info!(shop, bundle_id, discount_id, "Discount disabled");
                }
                Err(e) if e.is_not_found() => {
                    tracing::warn!(shop, bundle_id, discount_id, "Linked discount already gone");
                }
                Err(e) => return Err(remote_update(RemoteResource::Discount, discount_id, &e)),
            }
        }

        self.links.set_discount_active(shop, bundle_id, false).await?;
        Ok(())
    }

    /// Create a discount for `bundle` and record it, removing the discount
    /// again if the link cannot be written.
    async fn attach_discount(&self, shop: &str, bundle: &Bundle) -> Result<RemoteId, CoreError> {
        let draft = discount_for(&bundle.name, bundle.discount_percent, &bundle.components, Utc::now());
        let discount_id = self
            .discounts
            .create(shop, &draft)
            .await
            .map_err(|e| remote_create(RemoteResource::Discount, &e))?;

        let link = UpsertDiscountLink {
            bundle_id: bundle.id.clone(),
            discount_id: Some(discount_id.clone()),
            discount_active: true,
            bundle_name: bundle.name.clone(),
            shop: shop.to_string(),
        };
        match self.links.upsert(&link).await {
            Ok(_) => {
                tracing::info!(shop, bundle_id = %bundle.id, discount_id = %discount_id, "Discount attached");
                Ok(discount_id)
            }
            Err(e) => match self.delete_remote_discount(shop, &discount_id).await {
                Ok(()) => Err(CoreError::Storage(format!(
                    "Failed to record discount link for bundle {}: {e}",
                    bundle.id
                ))),
                Err(rollback) => Err(CoreError::Consistency {
                    bundle_id: Some(bundle.id.clone()),
                    discount_id: Some(discount_id),
                    message: format!("link write failed ({e}) and rollback failed ({rollback})"),
                }),
            },
        }
    }

    // ---- helpers ----

    async fn links_by_bundle(&self, shop: &str) -> Result<HashMap<String, DiscountLink>, CoreError> {
        Ok(self
            .links
            .list(shop)
            .await?
            .into_iter()
            .map(|l| (l.bundle_id.clone(), l))
            .collect())
    }

    /// Delete a remote discount, treating "already gone" as success.
    async fn delete_remote_discount(&self, shop: &str, id: &str) -> Result<(), RemoteError> {
        match self.discounts.delete(shop, id).await {
            Err(e) if e.is_not_found() => {
                tracing::debug!(shop, discount_id = id, "Discount already deleted");
                Ok(())
            }
            other => other,
        }
    }

    /// Delete a remote bundle, treating "already gone" as success.
    async fn delete_remote_bundle(&self, shop: &str, id: &str) -> Result<(), RemoteError> {
        match self.bundles.delete(shop, id).await {
            Err(e) if e.is_not_found() => {
                tracing::debug!(shop, bundle_id = id, "Bundle already deleted");
                Ok(())
            }
            other => other,
        }
    }
}
