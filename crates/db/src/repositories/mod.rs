//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod ab_assignment_repo;
pub mod analytics_event_repo;
pub mod auto_bundle_rule_repo;
pub mod discount_link_repo;
pub mod recommendation_repo;

pub use ab_assignment_repo::AbAssignmentRepo;
pub use analytics_event_repo::AnalyticsEventRepo;
pub use auto_bundle_rule_repo::AutoBundleRuleRepo;
pub use discount_link_repo::DiscountLinkRepo;
pub use recommendation_repo::RecommendationRepo;
