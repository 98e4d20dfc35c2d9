pub mod analytics;
pub mod bundles;
pub mod health;
pub mod rules;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Every route acts on the shop named by the `X-Shop-Domain` header.
///
/// ```text
/// /bundles                       list, create
/// /bundles/import                bulk create (POST)
/// /bundles/orphaned              active bundles without a live discount
/// /bundles/{id}                  get, update (PATCH), delete
///
/// /rules                         list, create
/// /rules/sync                    re-drive all active rules (POST)
/// /rules/{id}                    delete
/// /rules/{id}/toggle             activate / deactivate (POST)
///
/// /assignments                   sticky variant assignment (POST)
/// /events                        track storefront event (POST, 202)
/// /analytics                     per-variant funnel metrics
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/bundles", bundles::router())
        .nest("/rules", rules::router())
        .route("/assignments", post(handlers::assignments::assign))
        .route("/events", post(handlers::events::track))
        .merge(analytics::router())
}
