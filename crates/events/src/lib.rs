//! Storefront event ingestion.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`StorefrontEvent`]: one tracked shopper interaction.
//! - [`EventPersistence`]: background service that appends every event to
//!   an [`EventSink`], by default the `analytics_events` table.

pub mod bus;
pub mod persistence;

pub use bus::{EventBus, StorefrontEvent};
pub use persistence::{EventPersistence, EventSink, SinkError};
