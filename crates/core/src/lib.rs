//! Pure domain types and logic for bundle discounts, auto-bundle rules,
//! variant assignment and funnel analytics. Nothing in this crate performs
//! I/O.

pub mod ab_testing;
pub mod analytics;
pub mod auto_bundle;
pub mod bundle;
pub mod error;
pub mod shop;
pub mod threshold_validation;
pub mod types;
