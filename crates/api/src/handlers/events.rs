use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bundlewise_engine::analytics::TrackEvent;

use crate::error::AppResult;
use crate::middleware::shop::ShopDomain;
use crate::state::AppState;

/// POST /api/v1/events
///
/// Returns 202 as soon as the event is validated and published.
pub async fn track(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
    Json(input): Json<TrackEvent>,
) -> AppResult<StatusCode> {
    state.analytics.track_event(&shop, input)?;
    Ok(StatusCode::ACCEPTED)
}
