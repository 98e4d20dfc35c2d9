//! Row models and insert DTOs, one module per table.

pub mod ab_assignment;
pub mod analytics_event;
pub mod auto_bundle_rule;
pub mod discount_link;
pub mod recommendation;
