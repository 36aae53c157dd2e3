//! Complexity score and cost estimates.
//!
//! These are linear heuristics. The only contract is determinism: the same
//! graph always yields the same numbers.

use std::collections::HashMap;

use crate::classify;
use crate::config::EstimatorConfig;
use crate::parse::types::{Node, WorkflowGraph};
use crate::registry::NodeTypeRegistry;
use crate::resolve::Connections;
use crate::snapshot::types::{Bottleneck, ComplexityLevel};

pub const BOTTLENECK_REASON: &str = "High step count sampling";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeCost {
    /// Seconds.
    pub time: f64,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub score: f64,
    pub level: ComplexityLevel,
    pub node_count: usize,
    pub custom_node_count: usize,
    pub connection_count: usize,
    /// Workflow-level time: base + per-node overhead, in seconds.
    pub execution_time: f64,
    /// Sum of per-node time estimates, in seconds.
    pub total_node_time: f64,
    pub vram_mb: f64,
    pub node_costs: HashMap<String, NodeCost>,
    pub bottlenecks: Vec<Bottleneck>,
}

pub fn classify_score(score: f64) -> ComplexityLevel {
    if score > 100.0 {
        ComplexityLevel::Expert
    } else if score > 50.0 {
        ComplexityLevel::Complex
    } else if score > 20.0 {
        ComplexityLevel::Moderate
    } else {
        ComplexityLevel::Simple
    }
}

pub fn node_time(node: &Node, config: &EstimatorConfig) -> f64 {
    if classify::is_sampler(&node.class_type) {
        node.number("steps").unwrap_or(config.default_steps) * config.time_per_step
    } else {
        config.default_node_time
    }
}

pub fn node_memory(node: &Node, config: &EstimatorConfig) -> f64 {
    match config.memory_mb.get(&node.class_type) {
        Some(mb) => *mb,
        None if classify::is_sampler(&node.class_type) => config.sampler_memory_mb,
        None if classify::is_checkpoint_loader(&node.class_type) => config.checkpoint_memory_mb,
        None => config.default_memory_mb,
    }
}

pub fn estimate(
    graph: &WorkflowGraph,
    registry: &NodeTypeRegistry,
    connections: &Connections,
    config: &EstimatorConfig,
) -> Estimate {
    let node_count = graph.len();
    let custom_node_count = graph
        .iter()
        .filter(|(_, n)| !registry.contains(&n.class_type))
        .count();
    let connection_count = connections.len();

    let score = node_count as f64 + 2.0 * custom_node_count as f64 + 0.5 * connection_count as f64;

    let mut node_costs = HashMap::with_capacity(node_count);
    let mut bottlenecks = Vec::new();
    let mut total_node_time = 0.0;
    let mut vram_mb = 0.0;

    for (id, node) in graph.iter() {
        let cost = NodeCost {
            time: node_time(node, config),
            memory_mb: node_memory(node, config),
        };
        if cost.time > config.bottleneck_threshold {
            bottlenecks.push(Bottleneck {
                node_id: id.to_string(),
                class_type: node.class_type.clone(),
                estimated_time: cost.time,
                reason: BOTTLENECK_REASON.to_string(),
            });
        }
        total_node_time += cost.time;
        vram_mb += cost.memory_mb;
        node_costs.insert(id.to_string(), cost);
    }

    Estimate {
        score,
        level: classify_score(score),
        node_count,
        custom_node_count,
        connection_count,
        execution_time: config.base_time + config.time_per_node * node_count as f64,
        total_node_time,
        vram_mb,
        node_costs,
        bottlenecks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::sanitize;
    use crate::resolve::resolve;
    use serde_json::json;

    fn run(raw: serde_json::Value) -> Estimate {
        let graph = sanitize(&raw).unwrap().graph;
        let registry = NodeTypeRegistry::builtin();
        let conns = resolve(&graph, registry);
        estimate(&graph, registry, &conns, &EstimatorConfig::default())
    }

    #[test]
    fn score_thresholds() {
        assert_eq!(classify_score(20.0), ComplexityLevel::Simple);
        assert_eq!(classify_score(20.5), ComplexityLevel::Moderate);
        assert_eq!(classify_score(51.0), ComplexityLevel::Complex);
        assert_eq!(classify_score(100.5), ComplexityLevel::Expert);
    }

    #[test]
    fn score_weighs_custom_nodes_and_connections() {
        let e = run(json!({
            "1": { "class_type": "CheckpointLoaderSimple", "inputs": { "ckpt_name": "a.ckpt" } },
            "2": { "class_type": "MyCustomNode", "inputs": { "model": ["1", 0], "clip": ["1", 1] } }
        }));
        assert_eq!(e.custom_node_count, 1);
        assert_eq!(e.connection_count, 2);
        assert_eq!(e.score, 2.0 + 2.0 + 1.0);
        assert_eq!(e.execution_time, 34.0);
    }

    #[test]
    fn long_sampler_is_bottleneck() {
        let e = run(json!({
            "1": { "class_type": "KSampler", "inputs": { "steps": 40 } },
            "2": { "class_type": "KSampler", "inputs": { "steps": 30 } },
            "3": { "class_type": "CheckpointLoaderSimple", "inputs": {} }
        }));
        assert_eq!(e.bottlenecks.len(), 1);
        assert_eq!(e.bottlenecks[0].node_id, "1");
        assert_eq!(e.bottlenecks[0].estimated_time, 20.0);
        assert_eq!(e.bottlenecks[0].reason, BOTTLENECK_REASON);
        assert_eq!(e.node_costs["2"].time, 15.0);
        assert_eq!(e.node_costs["3"].time, 5.0);
        assert_eq!(e.vram_mb, 1500.0 + 1500.0 + 2000.0);
        assert_eq!(e.total_node_time, 40.0);
    }

    #[test]
    fn loader_variants_fall_back_to_checkpoint_memory() {
        let e = run(json!({
            "1": { "class_type": "UNETLoader", "inputs": { "unet_name": "flux1-dev.safetensors" } },
            "2": { "class_type": "ImageOnlyCheckpointLoader", "inputs": {} },
            "3": { "class_type": "SamplerCustomAdvanced", "inputs": {} },
            "4": { "class_type": "VAEDecode", "inputs": {} }
        }));
        assert_eq!(e.node_costs["1"].memory_mb, 2000.0);
        assert_eq!(e.node_costs["2"].memory_mb, 2000.0);
        assert_eq!(e.node_costs["3"].memory_mb, 1500.0);
        assert_eq!(e.node_costs["4"].memory_mb, 100.0);
    }

    #[test]
    fn deterministic() {
        let raw = json!({
            "1": { "class_type": "KSampler", "inputs": { "steps": 25 } },
            "2": { "class_type": "ControlNetApply", "inputs": {} }
        });
        assert_eq!(run(raw.clone()), run(raw));
    }
}
