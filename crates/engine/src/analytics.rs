//! Event tracking and per-variant funnel metrics.

use std::collections::BTreeMap;
use std::sync::Arc;

use bundlewise_core::analytics::{Aggregation, EventType, VariantMetrics};
use bundlewise_core::error::CoreError;
use bundlewise_core::shop::normalize_shop_domain;
use bundlewise_events::{EventBus, StorefrontEvent};
use serde::Deserialize;

use crate::store::EventLog;

/// A tracking request from the storefront.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEvent {
    #[serde(default)]
    pub bundle_id: Option<String>,
    pub product_id: String,
    pub event_type: String,
    pub session_id: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

pub struct AnalyticsService {
    bus: Arc<EventBus>,
    log: Arc<dyn EventLog>,
}

impl AnalyticsService {
    pub fn new(bus: Arc<EventBus>, log: Arc<dyn EventLog>) -> Self {
        Self { bus, log }
    }

    /// Validate and publish an event. Persistence happens in the background
    /// and its failures are only logged.
    pub fn track_event(&self, shop: &str, input: TrackEvent) -> Result<(), CoreError> {
        let shop = normalize_shop_domain(shop)?;
        let event_type: EventType = input.event_type.parse()?;
        if input.product_id.trim().is_empty() {
            return Err(CoreError::Validation("productId is required".into()));
        }
        if input.session_id.trim().is_empty() {
            return Err(CoreError::Validation("sessionId is required".into()));
        }

        let mut event = StorefrontEvent::new(shop, input.product_id, event_type, input.session_id);
        if let Some(bundle_id) = input.bundle_id.filter(|b| !b.is_empty()) {
            event = event.with_bundle(bundle_id);
        }
        match input.metadata {
            Some(meta @ serde_json::Value::Object(_)) => event = event.with_metadata(meta),
            Some(serde_json::Value::Null) | None => {}
            Some(_) => {
                return Err(CoreError::Validation("metadata must be an object".into()));
            }
        }

        self.bus.publish(event);
        Ok(())
    }

    /// Funnel metrics per variant group, optionally for one product.
    pub async fn aggregate(
        &self,
        shop: &str,
        product_id: Option<&str>,
    ) -> Result<BTreeMap<String, VariantMetrics>, CoreError> {
        let shop = normalize_shop_domain(shop)?;
        let facts = self.log.facts(&shop, product_id).await?;

        let mut aggregation = Aggregation::new();
        for fact in &facts {
            match fact.event_type.parse::<EventType>() {
                Ok(event_type) => aggregation.record(event_type, fact.variant_group_id.as_deref()),
                Err(e) => tracing::warn!(shop = %shop, error = %e, "Skipping unrecognised event"),
            }
        }
        Ok(aggregation.metrics())
    }
}
