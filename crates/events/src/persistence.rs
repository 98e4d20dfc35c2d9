//! Durable event persistence service.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and appends every received [`StorefrontEvent`] to an [`EventSink`]. It
//! runs as a long-lived background task and exits when the bus is dropped.
//! Failures are logged and never reach the publisher.

use std::sync::Arc;

use async_trait::async_trait;
use bundlewise_db::repositories::AnalyticsEventRepo;
use bundlewise_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::StorefrontEvent;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Event rejected: {0}")]
    Rejected(String),
}

/// Append-only destination for tracked events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn append(&self, event: &StorefrontEvent) -> Result<(), SinkError>;
}

#[async_trait]
impl EventSink for DbPool {
    async fn append(&self, event: &StorefrontEvent) -> Result<(), SinkError> {
        AnalyticsEventRepo::insert(self, &event.to_row()).await?;
        Ok(())
    }
}

#[async_trait]
impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    async fn append(&self, event: &StorefrontEvent) -> Result<(), SinkError> {
        (**self).append(event).await
    }
}

/// Background service that persists storefront events.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop until the channel closes.
    pub async fn run<S: EventSink>(sink: S, mut receiver: broadcast::Receiver<StorefrontEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = sink.append(&event).await {
                        tracing::error!(
                            error = %e,
                            shop = %event.shop,
                            event_type = event.event_type.as_str(),
                            "Failed to persist storefront event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }
}
