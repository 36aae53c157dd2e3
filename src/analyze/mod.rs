//! Heuristic analysis over the sanitized graph: feature flags and cost
//! estimates.

pub mod complexity;
pub mod features;

pub use complexity::{estimate, Estimate, NodeCost};
pub use features::{detect_features, Feature};
