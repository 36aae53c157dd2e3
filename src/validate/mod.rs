//! Validation phase.
//!
//! Checks a sanitized graph for structural, schema and connection problems
//! and collects every finding. Nothing here fails fast.

pub mod node_rules;
pub mod structural;

pub use structural::validate_connections;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::ValueRanges;
use crate::error::ValidationIssue;
use crate::parse::types::WorkflowGraph;
use crate::registry::NodeTypeRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub node_count: usize,
    /// Distinct class types, sorted.
    pub node_types: Vec<String>,
}

impl ValidationReport {
    pub fn new(node_count: usize, node_types: Vec<String>) -> Self {
        ValidationReport {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            node_count,
            node_types,
        }
    }

    /// Report for input that never became a graph.
    pub fn fatal(issue: ValidationIssue) -> Self {
        let mut report = Self::new(0, Vec::new());
        report.push(issue);
        report
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        if issue.is_error() {
            self.errors.push(issue);
        } else {
            self.warnings.push(issue);
        }
        self.is_valid = self.errors.is_empty();
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    /// Errors and warnings together, errors first.
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

/// Validate the entire graph (structural + per-node rules).
pub fn validate_graph(
    graph: &WorkflowGraph,
    registry: &NodeTypeRegistry,
    ranges: &ValueRanges,
) -> ValidationReport {
    let node_types: BTreeSet<String> = graph.iter().map(|(_, n)| n.class_type.clone()).collect();
    let mut report = ValidationReport::new(graph.len(), node_types.into_iter().collect());

    report.extend(structural::validate_structural(graph));
    for (id, node) in graph.iter() {
        report.extend(node_rules::validate_node(id, node, registry, ranges));
    }

    report
}
