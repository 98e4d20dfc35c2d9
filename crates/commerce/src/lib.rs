//! Client side of the commerce platform that owns bundles and discounts.
//!
//! - [`BundleStore`], [`DiscountStore`], [`ProductCatalog`]: the narrow
//!   remote interfaces the synchronizer and rule engine depend on.
//! - [`AdminApi`]: GraphQL implementation of all three over `reqwest`.
//! - [`mock`]: in-memory implementations with failure injection for tests.

pub mod admin;
pub mod config;
pub mod error;
pub mod graphql;
pub mod mock;
pub mod store;

pub use admin::AdminApi;
pub use config::CommerceConfig;
pub use error::RemoteError;
pub use store::{BundleStore, DiscountStore, ProductCatalog};
