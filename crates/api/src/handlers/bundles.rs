//! Handlers for the `/bundles` resource.
//!
//! Every write goes through the discount synchronizer so the remote bundle,
//! its automatic discount and the local link stay in step.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bundlewise_core::bundle::{BundlePatch, ImportReport, NewBundle};
use bundlewise_engine::synchronizer::{BundleView, OrphanedBundle};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::shop::ShopDomain;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /bundles/import`.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub bundles: Vec<NewBundle>,
}

/// POST /api/v1/bundles
pub async fn create(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
    Json(input): Json<NewBundle>,
) -> AppResult<(StatusCode, Json<DataResponse<BundleView>>)> {
    let view = state.synchronizer.create_bundle(&shop, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// POST /api/v1/bundles/import
///
/// Always 200 once the batch is accepted; per-item outcomes are in the report.
pub async fn import(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
    Json(input): Json<ImportRequest>,
) -> AppResult<Json<DataResponse<ImportReport>>> {
    let report = state
        .synchronizer
        .import_bundles(&shop, input.bundles)
        .await?;
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/v1/bundles
pub async fn list(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
) -> AppResult<Json<DataResponse<Vec<BundleView>>>> {
    let bundles = state.synchronizer.list_bundles(&shop).await?;
    Ok(Json(DataResponse { data: bundles }))
}

/// GET /api/v1/bundles/orphaned
pub async fn orphaned(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
) -> AppResult<Json<DataResponse<Vec<OrphanedBundle>>>> {
    let orphans = state.synchronizer.find_orphaned_bundles(&shop).await?;
    Ok(Json(DataResponse { data: orphans }))
}

/// GET /api/v1/bundles/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<BundleView>>> {
    let view = state.synchronizer.get_bundle(&shop, &id).await?;
    Ok(Json(DataResponse { data: view }))
}

/// PATCH /api/v1/bundles/{id}
pub async fn update(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
    Path(id): Path<String>,
    Json(patch): Json<BundlePatch>,
) -> AppResult<Json<DataResponse<BundleView>>> {
    let view = state.synchronizer.update_bundle(&shop, &id, &patch).await?;
    Ok(Json(DataResponse { data: view }))
}

/// DELETE /api/v1/bundles/{id}
pub async fn delete(
    State(state): State<AppState>,
    ShopDomain(shop): ShopDomain,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.synchronizer.delete_bundle(&shop, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
