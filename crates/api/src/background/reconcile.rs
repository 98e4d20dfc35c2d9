//! Periodic scan for bundles that are not backed by a live discount.
//!
//! Runs [`DiscountSynchronizer::find_orphaned_bundles`] for every shop with
//! recorded links or rules, plus any configured shops, and logs what it
//! finds. It does not repair anything.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use bundlewise_engine::{DiscountSynchronizer, RuleEngine};
use tokio_util::sync::CancellationToken;

/// Run the reconciliation loop until `cancel` is triggered.
pub async fn run(
    sync: Arc<DiscountSynchronizer>,
    rules: Arc<RuleEngine>,
    configured_shops: Vec<String>,
    every: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = every.as_secs(),
        configured_shops = configured_shops.len(),
        "Reconciliation job started"
    );

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reconciliation job stopping");
                break;
            }
            _ = interval.tick() => {
                let found = scan_once(&sync, &rules, &configured_shops).await;
                if found > 0 {
                    tracing::warn!(found, "Reconciliation: orphaned bundles present");
                } else {
                    tracing::debug!("Reconciliation: no orphaned bundles");
                }
            }
        }
    }
}

/// Shops to scan: configured ones plus every shop with links or rules.
/// A failing source is logged and skipped.
pub async fn shops_to_scan(
    sync: &DiscountSynchronizer,
    rules: &RuleEngine,
    configured_shops: &[String],
) -> BTreeSet<String> {
    let mut shops: BTreeSet<String> = configured_shops.iter().cloned().collect();

    match sync.known_shops().await {
        Ok(found) => shops.extend(found),
        Err(e) => tracing::error!(error = %e, "Reconciliation: could not list linked shops"),
    }
    match rules.known_shops().await {
        Ok(found) => shops.extend(found),
        Err(e) => tracing::error!(error = %e, "Reconciliation: could not list rule shops"),
    }
    shops
}

/// Scan every shop once and return the number of orphans found.
pub async fn scan_once(
    sync: &DiscountSynchronizer,
    rules: &RuleEngine,
    configured_shops: &[String],
) -> usize {
    let mut found = 0;
    for shop in shops_to_scan(sync, rules, configured_shops).await {
        match sync.find_orphaned_bundles(&shop).await {
            Ok(orphans) => {
                for orphan in &orphans {
                    tracing::warn!(
                        shop = %shop,
                        bundle_id = %orphan.bundle_id,
                        name = %orphan.name,
                        reason = ?orphan.reason,
                        "Active bundle has no live discount"
                    );
                }
                found += orphans.len();
            }
            Err(e) => {
                tracing::error!(shop = %shop, error = %e, "Reconciliation: scan failed");
            }
        }
    }
    found
}
