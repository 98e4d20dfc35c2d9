use std::sync::Arc;

use bundlewise_engine::{AnalyticsService, AssignmentService, DiscountSynchronizer, RuleEngine};
use bundlewise_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind an `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database pool, absent when the engine runs on in-memory stores.
    pub pool: Option<bundlewise_db::DbPool>,
    pub config: Arc<ServerConfig>,
    pub synchronizer: Arc<DiscountSynchronizer>,
    pub rules: Arc<RuleEngine>,
    pub assignments: Arc<AssignmentService>,
    pub analytics: Arc<AnalyticsService>,
    /// Storefront event bus; the persistence task subscribes to it.
    pub event_bus: Arc<EventBus>,
}
