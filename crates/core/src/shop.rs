//! Shop (tenant) identifiers.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Shops are addressed by their platform hostname, e.g. `acme.example-shop.com`.
static SHOP_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]*(\.[a-z0-9][a-z0-9-]*)+$").expect("shop domain regex is valid")
});

/// Normalize and validate a shop domain.
pub fn normalize_shop_domain(raw: &str) -> Result<String, CoreError> {
    let shop = raw.trim().to_ascii_lowercase();
    if shop.len() > 255 || !SHOP_DOMAIN.is_match(&shop) {
        return Err(CoreError::Validation(format!(
            "Invalid shop domain '{raw}'"
        )));
    }
    Ok(shop)
}
