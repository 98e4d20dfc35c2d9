pub mod analytics;
pub mod assignments;
pub mod bundles;
pub mod events;
pub mod health;
pub mod rules;
