//! Raw JSON → sanitized [`WorkflowGraph`].
//!
//! Malformed entries are dropped with a warning instead of failing the whole
//! parse; a workflow is allowed to be partially valid.

use serde_json::{Map, Value};

use super::types::{Node, PortValue, Position, Size, WorkflowGraph};
use crate::error::ValidationIssue;

/// Result of sanitizing a raw workflow object.
#[derive(Debug, Clone)]
pub struct Sanitized {
    pub graph: WorkflowGraph,
    /// One `P003` warning per dropped or normalized entry.
    pub warnings: Vec<ValidationIssue>,
}

/// Sanitize an arbitrary JSON value. A non-object root is a fatal `P002`.
pub fn sanitize(raw: &Value) -> Result<Sanitized, ValidationIssue> {
    let Some(entries) = raw.as_object() else {
        return Err(ValidationIssue::syntax(
            "P002",
            format!("Workflow must be a JSON object, found {}", json_kind(raw)),
        ));
    };

    let mut nodes = Vec::with_capacity(entries.len());
    let mut warnings = Vec::new();

    for (id, entry) in entries {
        match sanitize_node(id, entry, &mut warnings) {
            Ok(node) => nodes.push((id.clone(), node)),
            Err(reason) => {
                tracing::warn!(node_id = %id, %reason, "dropping malformed workflow node");
                warnings.push(
                    ValidationIssue::structure(
                        "P003",
                        format!("Dropped node '{}': {}", id, reason),
                        Some(id.clone()),
                    )
                    .warning(),
                );
            }
        }
    }

    Ok(Sanitized {
        graph: WorkflowGraph::from_nodes(nodes),
        warnings,
    })
}

fn sanitize_node(
    id: &str,
    entry: &Value,
    warnings: &mut Vec<ValidationIssue>,
) -> Result<Node, String> {
    let Some(obj) = entry.as_object() else {
        return Err(format!("entry is {}, not an object", json_kind(entry)));
    };

    let class_type = match obj.get("class_type") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::String(_)) => return Err("class_type is empty".into()),
        Some(other) => return Err(format!("class_type is {}, not a string", json_kind(other))),
        None => return Err("missing class_type".into()),
    };

    let mut node = Node::new(&class_type);

    match obj.get("inputs") {
        Some(Value::Object(inputs)) => {
            node.inputs = inputs
                .iter()
                .map(|(name, raw)| (name.clone(), PortValue::from_raw(raw)))
                .collect();
        }
        None | Some(Value::Null) => {}
        Some(other) => {
            tracing::warn!(node_id = %id, kind = json_kind(other), "normalizing non-object inputs");
            warnings.push(
                ValidationIssue::structure(
                    "P003",
                    format!(
                        "Node '{}' has {} inputs; treated as empty",
                        id,
                        json_kind(other)
                    ),
                    Some(id.to_string()),
                )
                .warning(),
            );
        }
    }

    if let Some(meta) = obj.get("_meta").and_then(Value::as_object) {
        apply_meta(&mut node, meta);
    }

    Ok(node)
}

fn apply_meta(node: &mut Node, meta: &Map<String, Value>) {
    node.title = meta
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    node.position = meta.get("position").and_then(|v| {
        pair(v, "x", "y").map(|(x, y)| Position { x, y })
    });
    node.size = meta.get("size").and_then(|v| {
        pair(v, "width", "height").map(|(width, height)| Size { width, height })
    });
    node.color = meta.get("color").and_then(Value::as_str).map(str::to_string);
}

/// Accept `[a, b]` or `{first: a, second: b}`.
fn pair(value: &Value, first: &str, second: &str) -> Option<(f64, f64)> {
    match value {
        Value::Array(items) if items.len() == 2 => Some((items[0].as_f64()?, items[1].as_f64()?)),
        Value::Object(obj) => Some((obj.get(first)?.as_f64()?, obj.get(second)?.as_f64()?)),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
