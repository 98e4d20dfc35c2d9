//! Handlers for the `/rules` resource (auto-bundle rules).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bundlewise_core::auto_bundle::NewRule;
use bundlewise_core::bundle::ImportReport;
use bundlewise_core::types::DbId;
use bundlewise_db::models::auto_bundle_rule::AutoBundleRule;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::shop::ShopDomain;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /rules/{id}/toggle`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRule {
    pub is_active: bool,
}

/// GET /api/v1/rules
pub async fn list(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
) -> AppResult<Json<DataResponse<Vec<AutoBundleRule>>>> {
    let rules = state.rules.list_rules(&shop).await?;
    Ok(Json(DataResponse { data: rules }))
}

/// POST /api/v1/rules
pub async fn create(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
    Json(input): Json<NewRule>,
) -> AppResult<(StatusCode, Json<DataResponse<AutoBundleRule>>)> {
    let rule = state.rules.create_rule(&shop, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: rule })))
}

/// POST /api/v1/rules/sync
pub async fn sync(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
) -> AppResult<Json<DataResponse<ImportReport>>> {
    let report = state.rules.sync_rules(&shop).await?;
    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/rules/{id}/toggle
pub async fn toggle(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
    Path(id): Path<DbId>,
    Json(input): Json<ToggleRule>,
) -> AppResult<Json<DataResponse<AutoBundleRule>>> {
    let rule = state.rules.toggle_rule(&shop, id, input.is_active).await?;
    Ok(Json(DataResponse { data: rule }))
}

/// DELETE /api/v1/rules/{id}
pub async fn delete(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.rules.delete_rule(&shop, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
