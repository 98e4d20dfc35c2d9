use axum::routing::{get, post};
use axum::Router;

use crate::handlers::bundles;
use crate::state::AppState;

/// Routes mounted at `/bundles`.
///
/// ```text
/// GET    /            -> list
/// POST   /            -> create
/// POST   /import      -> import
/// GET    /orphaned    -> orphaned
/// GET    /{id}        -> get_by_id
/// PATCH  /{id}        -> update
/// DELETE /{id}        -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(bundles::list).post(bundles::create))
        .route("/import", post(bundles::import))
        .route("/orphaned", get(bundles::orphaned))
        .route(
            "/{id}",
            get(bundles::get_by_id)
                .patch(bundles::update)
                .delete(bundles::delete),
        )
}
