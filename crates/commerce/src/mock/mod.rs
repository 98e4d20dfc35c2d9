//! In-memory remote stores for testing.
//!
//! Each store keeps its objects behind a `tokio::sync::RwLock` and exposes
//! per-operation failure switches plus inspection helpers so sagas can be
//! exercised without network access.

mod bundles;
mod catalog;
mod discounts;

pub use bundles::MockBundleStore;
pub use catalog::MockCatalog;
pub use discounts::{MockDiscount, MockDiscountStore};

use crate::error::RemoteError;

/// Error returned by an operation whose failure switch is on.
pub(crate) fn injected(operation: &str) -> RemoteError {
    RemoteError::UserErrors(vec![format!("injected {operation} failure")])
}
