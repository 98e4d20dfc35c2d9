use axum::extract::State;
use axum::Json;
use bundlewise_engine::assignment::Assignment;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::shop::ShopDomain;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub session_id: String,
    pub product_id: String,
}

/// POST /api/v1/assignments
pub async fn assign(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
    Json(input): Json<AssignRequest>,
) -> AppResult<Json<DataResponse<Assignment>>> {
    let assignment = state
        .assignments
        .assign(&shop, &input.session_id, &input.product_id)
        .await?;
    Ok(Json(DataResponse { data: assignment }))
}
