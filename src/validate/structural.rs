//! Graph-level structural rules (S001–S004) and connection integrity
//! (C001–C002).

use crate::classify;
use crate::error::ValidationIssue;
use crate::parse::types::{Slot, WorkflowGraph};
use crate::resolve::Connections;

/// Run all structural and connection rules. Returns every issue found.
pub fn validate_structural(graph: &WorkflowGraph) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    s001_non_empty(graph, &mut issues);
    s002_numeric_ids(graph, &mut issues);
    s003_completeness(graph, &mut issues);
    c001_c002_connection_refs(graph, &mut issues);

    issues
}

fn s001_non_empty(graph: &WorkflowGraph, issues: &mut Vec<ValidationIssue>) {
    if graph.is_empty() {
        issues.push(ValidationIssue::structure(
            "S001",
            "Workflow must contain at least one node",
            None,
        ));
    }
}

fn s002_numeric_ids(graph: &WorkflowGraph, issues: &mut Vec<ValidationIssue>) {
    for id in graph.ids() {
        if id.parse::<u64>().is_err() {
            issues.push(
                ValidationIssue::structure(
                    "S002",
                    format!("Node id '{}' is not a numeric string", id),
                    Some(id.to_string()),
                )
                .warning(),
            );
        }
    }
}

/// A sub-graph may legitimately lack any of these, so each absence is only
/// a notice.
fn s003_completeness(graph: &WorkflowGraph, issues: &mut Vec<ValidationIssue>) {
    if graph.is_empty() {
        return;
    }

    let families: [(&str, fn(&str) -> bool); 4] = [
        ("model loader", classify::is_model_loader),
        ("text encoder", classify::is_text_encoder),
        ("sampler", classify::is_sampler),
        ("VAE decoder", classify::is_decoder),
    ];

    for (label, pred) in families {
        if graph.nodes_where(pred).next().is_none() {
            issues.push(
                ValidationIssue::structure("S003", format!("Workflow has no {} node", label), None)
                    .warning(),
            );
        }
    }
}

/// Rules that need resolved edges. Cycles are legal to describe but cannot
/// execute, so they are only a warning.
pub fn validate_connections(connections: &Connections) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if let Some(node_id) = connections.graph().find_cycle() {
        issues.push(
            ValidationIssue::structure(
                "S004",
                format!("Connections form a cycle through node '{}'", node_id),
                Some(node_id.to_string()),
            )
            .warning(),
        );
    }
    issues
}

fn c001_c002_connection_refs(graph: &WorkflowGraph, issues: &mut Vec<ValidationIssue>) {
    for (id, node) in graph.iter() {
        for (input, conn) in node.connections() {
            if !graph.contains(&conn.source) {
                issues.push(ValidationIssue::connection(
                    "C001",
                    format!(
                        "Input '{}' references unknown source node '{}'",
                        input, conn.source
                    ),
                    Some(id.to_string()),
                ));
            }
            if let Slot::Malformed(raw) = &conn.slot {
                issues.push(ValidationIssue::connection(
                    "C002",
                    format!(
                        "Input '{}' has output index {} which is not a non-negative integer",
                        input, raw
                    ),
                    Some(id.to_string()),
                ));
            }
        }
    }
}
