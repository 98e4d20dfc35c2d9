use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::rules;
use crate::state::AppState;

/// Routes mounted at `/rules`.
///
/// ```text
/// GET    /              -> list
/// POST   /              -> create
/// POST   /sync          -> sync
/// DELETE /{id}          -> delete
/// POST   /{id}/toggle   -> toggle
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(rules::list).post(rules::create))
        .route("/sync", post(rules::sync))
        .route("/{id}", delete(rules::delete))
        .route("/{id}/toggle", post(rules::toggle))
}
