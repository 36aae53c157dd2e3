//! Parse phase: JSON text → sanitized workflow graph.

pub mod sanitize;
pub mod types;

pub use sanitize::{sanitize, Sanitized};
pub use types::*;

use crate::error::ValidationIssue;

/// Deserialize workflow JSON text. Unparseable text is a single fatal `P001`.
pub fn parse(json: &str) -> Result<serde_json::Value, ValidationIssue> {
    serde_json::from_str::<serde_json::Value>(json).map_err(|e| {
        ValidationIssue::syntax("P001", format!("Failed to parse workflow JSON: {}", e))
    })
}

/// Parse JSON text and sanitize it in one step.
pub fn parse_and_sanitize(json: &str) -> Result<Sanitized, ValidationIssue> {
    let raw = parse(json)?;
    sanitize(&raw)
}
