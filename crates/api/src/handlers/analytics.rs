use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use bundlewise_core::analytics::VariantMetrics;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::shop::ShopDomain;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub product_id: Option<String>,
}

/// GET /api/v1/analytics?productId=
///
/// Funnel metrics keyed by variant group; untagged events land in `unknown`.
pub async fn aggregate(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<DataResponse<BTreeMap<String, VariantMetrics>>>> {
    let metrics = state
        .analytics
        .aggregate(&shop, query.product_id.as_deref().filter(|p| !p.is_empty()))
        .await?;
    Ok(Json(DataResponse { data: metrics }))
}
