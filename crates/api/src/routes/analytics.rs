use axum::routing::get;
use axum::Router;

use crate::handlers::analytics;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/analytics", get(analytics::aggregate))
}
