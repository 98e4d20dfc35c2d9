//! Bundle lifecycle services.
//!
//! - [`DiscountSynchronizer`]: keeps each remote bundle paired with exactly
//!   one remote discount through create, update, delete and import sagas.
//! - [`RuleEngine`]: turns auto-bundle rules into generated bundles and
//!   switches their discounts on and off.
//! - [`AssignmentService`]: sticky A/B variant assignment.
//! - [`AnalyticsService`]: event tracking and per-variant funnel metrics.
//!
//! Local persistence sits behind the traits in [`store`] with a Postgres
//! and an in-memory implementation.

pub mod analytics;
pub mod assignment;
pub mod locks;
pub mod rules;
pub mod store;
pub mod synchronizer;

pub use analytics::AnalyticsService;
pub use assignment::AssignmentService;
pub use rules::RuleEngine;
pub use synchronizer::DiscountSynchronizer;
