//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>`. Publishing never blocks and
//! never fails from the caller's point of view.

use bundlewise_core::analytics::{variant_of, EventType};
use bundlewise_core::types::Timestamp;
use bundlewise_db::models::analytics_event::NewAnalyticsEvent;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// StorefrontEvent
// ---------------------------------------------------------------------------

/// A shopper interaction reported by the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontEvent {
    pub shop: String,
    pub bundle_id: Option<String>,
    pub product_id: String,
    pub event_type: EventType,
    pub session_id: String,
    /// Free-form context. `variantGroupId` ties the event to a variant.
    pub metadata: serde_json::Value,
    pub occurred_at: Timestamp,
}

impl StorefrontEvent {
    pub fn new(
        shop: impl Into<String>,
        product_id: impl Into<String>,
        event_type: EventType,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            shop: shop.into(),
            bundle_id: None,
            product_id: product_id.into(),
            event_type,
            session_id: session_id.into(),
            metadata: serde_json::Value::Object(Default::default()),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_bundle(mut self, bundle_id: impl Into<String>) -> Self {
        self.bundle_id = Some(bundle_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Variant group the event was recorded under, if any.
    pub fn variant_group_id(&self) -> Option<&str> {
        variant_of(&self.metadata)
    }

    /// Row to append for this event.
    pub fn to_row(&self) -> NewAnalyticsEvent {
        NewAnalyticsEvent {
            shop: self.shop.clone(),
            bundle_id: self.bundle_id.clone(),
            product_id: self.product_id.clone(),
            event_type: self.event_type.as_str().to_string(),
            session_id: self.session_id.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 4096;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<StorefrontEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: StorefrontEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorefrontEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
