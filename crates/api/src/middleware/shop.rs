//! Tenant extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bundlewise_core::shop::normalize_shop_domain;

use crate::error::AppError;

/// Header carrying the shop a request acts on.
pub const SHOP_HEADER: &str = "x-shop-domain";

/// Normalized shop domain taken from the `X-Shop-Domain` header.
///
/// ```ignore
/// async fn my_handler(ShopDomain(shop): ShopDomain) -> AppResult<Json<()>> {
///     tracing::info!(shop = %shop, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ShopDomain(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ShopDomain {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(SHOP_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::BadRequest("Missing X-Shop-Domain header".into()))?;

        Ok(ShopDomain(normalize_shop_domain(raw)?))
    }
}
