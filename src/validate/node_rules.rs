//! Per-node rules: class type presence (N001), schema conformance
//! (V001–V002) and plausible-value heuristics (N002–N007).

use crate::classify;
use crate::config::{Bounds, ValueRanges};
use crate::error::ValidationIssue;
use crate::parse::types::Node;
use crate::registry::NodeTypeRegistry;

/// Validate a single node. Returns all issues found.
pub fn validate_node(
    id: &str,
    node: &Node,
    registry: &NodeTypeRegistry,
    ranges: &ValueRanges,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let node_id = Some(id.to_string());

    if node.class_type.trim().is_empty() {
        issues.push(ValidationIssue::node(
            "N001",
            "Node is missing a class type",
            node_id,
        ));
        return issues;
    }

    match registry.get(&node.class_type) {
        Some(schema) => {
            for input in &schema.required_inputs {
                if !node.inputs.contains_key(input) {
                    issues.push(ValidationIssue::schema(
                        "V001",
                        format!(
                            "{} is missing required input '{}'",
                            node.class_type, input
                        ),
                        node_id.clone(),
                    ));
                }
            }
        }
        None => {
            issues.push(
                ValidationIssue::schema(
                    "V002",
                    format!("Unrecognized node type '{}'", node.class_type),
                    node_id.clone(),
                )
                .warning(),
            );
        }
    }

    check_value_ranges(id, node, ranges, &mut issues);

    issues
}

fn check_value_ranges(id: &str, node: &Node, ranges: &ValueRanges, issues: &mut Vec<ValidationIssue>) {
    let node_id = Some(id.to_string());

    if classify::is_sampler(&node.class_type) {
        if let Some(steps) = node.number("steps") {
            out_of_range(issues, "N002", "steps", steps, ranges.steps, id);
        }
        if let Some(cfg) = node.number("cfg") {
            out_of_range(issues, "N003", "cfg", cfg, ranges.cfg, id);
        }
    }

    for seed_input in ["seed", "noise_seed"] {
        if let Some(seed) = node.number(seed_input) {
            if seed < 0.0 {
                issues.push(
                    ValidationIssue::node(
                        "N004",
                        format!("{} {} is negative", seed_input, seed),
                        node_id.clone(),
                    )
                    .warning(),
                );
            }
        }
    }

    for dim in ["width", "height"] {
        let Some(value) = node.number(dim) else {
            continue;
        };
        let multiple = ranges.dimension_multiple as f64;
        let aligned = value.fract() == 0.0 && value % multiple == 0.0;
        if !aligned || !ranges.dimension.contains(value) {
            issues.push(
                ValidationIssue::node(
                    "N005",
                    format!(
                        "{} {} should be a multiple of {} within [{}, {}]",
                        dim, value, ranges.dimension_multiple, ranges.dimension.min, ranges.dimension.max
                    ),
                    node_id.clone(),
                )
                .warning(),
            );
        }
    }

    if let Some(batch) = node.number("batch_size") {
        out_of_range(issues, "N006", "batch_size", batch, ranges.batch_size, id);
    }

    if classify::is_checkpoint_loader(&node.class_type) {
        let file = node.string("ckpt_name").or_else(|| node.string("unet_name"));
        if let Some(file) = file {
            let lower = file.to_lowercase();
            if !ranges
                .checkpoint_extensions
                .iter()
                .any(|ext| lower.ends_with(&ext.to_lowercase()))
            {
                issues.push(
                    ValidationIssue::node(
                        "N007",
                        format!(
                            "Checkpoint '{}' does not end in one of {}",
                            file,
                            ranges.checkpoint_extensions.join(", ")
                        ),
                        node_id,
                    )
                    .warning(),
                );
            }
        }
    }
}

fn out_of_range(
    issues: &mut Vec<ValidationIssue>,
    code: &str,
    label: &str,
    value: f64,
    bounds: Bounds,
    id: &str,
) {
    if !bounds.contains(value) {
        issues.push(
            ValidationIssue::node(
                code,
                format!(
                    "{} {} is outside the expected range [{}, {}]",
                    label, value, bounds.min, bounds.max
                ),
                Some(id.to_string()),
            )
            .warning(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::PortValue;
    use serde_json::json;

    fn lit(v: serde_json::Value) -> PortValue {
        PortValue::Literal(v)
    }

    fn codes(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.code.as_str()).collect()
    }

    fn check(node: &Node) -> Vec<ValidationIssue> {
        validate_node("1", node, NodeTypeRegistry::builtin(), &ValueRanges::default())
    }

    #[test]
    fn empty_class_type_skips_schema() {
        let issues = check(&Node::new("  "));
        assert_eq!(codes(&issues), vec!["N001"]);
        assert!(issues[0].is_error());
    }

    #[test]
    fn missing_required_inputs_are_errors() {
        let node = Node::new("VAEDecode").with_input("samples", PortValue::from_raw(&json!(["3", 0])));
        let issues = check(&node);
        assert_eq!(codes(&issues), vec!["V001"]);
        assert!(issues[0].message.contains("'vae'"));
    }

    #[test]
    fn unknown_type_is_warning() {
        let issues = check(&Node::new("MyCustomNode"));
        assert_eq!(codes(&issues), vec!["V002"]);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn dimension_checks() {
        let node = Node::new("EmptyLatentImage")
            .with_input("width", lit(json!(500)))
            .with_input("height", lit(json!(8192)))
            .with_input("batch_size", lit(json!(1)));
        let issues = check(&node);
        assert_eq!(codes(&issues), vec!["N005", "N005"]);
        assert!(issues.iter().all(|i| !i.is_error()));
    }

    #[test]
    fn sampler_ranges() {
        let node = Node::new("KSampler")
            .with_input("steps", lit(json!(0)))
            .with_input("cfg", lit(json!(45.0)))
            .with_input("seed", lit(json!(-1)));
        let issues = check(&node);
        let codes = codes(&issues);
        assert!(codes.contains(&"N002"));
        assert!(codes.contains(&"N003"));
        assert!(codes.contains(&"N004"));
    }

    #[test]
    fn connected_values_are_not_range_checked() {
        let node = Node::new("EmptyLatentImage")
            .with_input("width", PortValue::from_raw(&json!(["9", 0])))
            .with_input("height", lit(json!(512)))
            .with_input("batch_size", lit(json!(1)));
        assert!(check(&node).is_empty());
    }

    #[test]
    fn checkpoint_extension() {
        let node = Node::new("CheckpointLoaderSimple").with_input("ckpt_name", lit(json!("model.bin")));
        assert_eq!(codes(&check(&node)), vec!["N007"]);
        let node = Node::new("CheckpointLoaderSimple").with_input("ckpt_name", lit(json!("Model.SafeTensors")));
        assert!(check(&node).is_empty());
    }
}
