//! Sampler chain and prompt extraction.

use std::collections::{HashSet, VecDeque};

use crate::classify;
use crate::parse::types::{Node, WorkflowGraph};
use crate::resolve::Connections;
use crate::snapshot::types::{PromptEmbedding, PromptKind, SamplerEntry};

/// Sampler-family nodes in graph order.
pub fn extract_sampler_chain(graph: &WorkflowGraph) -> Vec<SamplerEntry> {
    graph
        .nodes_where(classify::is_sampler)
        .map(|(id, node)| SamplerEntry {
            node_id: id.to_string(),
            class_type: node.class_type.clone(),
            sampler_name: node.string("sampler_name").map(str::to_string),
            scheduler: node.string("scheduler").map(str::to_string),
            steps: node.integer("steps").and_then(|s| u64::try_from(s).ok()),
            cfg: node.number("cfg"),
            denoise: node.number("denoise").unwrap_or(1.0),
            seed: node.integer("seed").or_else(|| node.integer("noise_seed")),
        })
        .collect()
}

/// Saturates instead of overflowing on absurd step counts.
pub fn total_steps(chain: &[SamplerEntry]) -> u64 {
    chain
        .iter()
        .filter_map(|s| s.steps)
        .fold(0u64, |acc, s| acc.saturating_add(s))
}

/// Every text-encode node with a literal prompt, classified by where its
/// conditioning ends up.
pub fn extract_prompts(graph: &WorkflowGraph, connections: &Connections) -> Vec<PromptEmbedding> {
    graph
        .nodes_where(classify::is_text_encoder)
        .filter_map(|(id, node)| {
            Some(PromptEmbedding {
                node_id: id.to_string(),
                kind: classify_prompt(id, connections),
                text: prompt_text(node)?.to_string(),
            })
        })
        .collect()
}

fn prompt_text(node: &Node) -> Option<&str> {
    node.prompt_texts().next()
}

/// Walk downstream breadth-first until the conditioning enters an input named
/// `positive` or `negative`. Samplers and conditioning nodes that forward a
/// positive/negative pair (e.g. `ControlNetApplyAdvanced`) both decide.
///
/// Encoders whose output never reaches such an input default to positive.
// TODO: orphan encoders are misclassified as positive; revisit once callers
// can express "unclassified" in the snapshot.
pub fn classify_prompt(encoder_id: &str, connections: &Connections) -> PromptKind {
    let mut queue = VecDeque::from([encoder_id]);
    let mut visited: HashSet<&str> = HashSet::from([encoder_id]);

    while let Some(current) = queue.pop_front() {
        for edge in connections.outgoing(current) {
            match edge.to_input_name.as_str() {
                "positive" => return PromptKind::Positive,
                "negative" => return PromptKind::Negative,
                _ => {}
            }
            if visited.insert(edge.to_node.as_str()) {
                queue.push_back(edge.to_node.as_str());
            }
        }
    }

    PromptKind::Positive
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::sanitize;
    use crate::registry::NodeTypeRegistry;
    use crate::resolve::resolve;
    use serde_json::json;

    #[test]
    fn classifies_through_intermediate_conditioning() {
        let graph = sanitize(&json!({
            "2": { "class_type": "CLIPTextEncode", "inputs": { "text": "a cat", "clip": ["1", 1] } },
            "3": { "class_type": "CLIPTextEncode", "inputs": { "text": "blurry", "clip": ["1", 1] } },
            "4": { "class_type": "ConditioningCombine", "inputs": { "conditioning_1": ["3", 0], "conditioning_2": ["3", 0] } },
            "5": { "class_type": "KSampler", "inputs": { "positive": ["2", 0], "negative": ["4", 0] } }
        }))
        .unwrap()
        .graph;
        let conns = resolve(&graph, NodeTypeRegistry::builtin());
        let prompts = extract_prompts(&graph, &conns);
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].kind, PromptKind::Positive);
        assert_eq!(prompts[1].kind, PromptKind::Negative);
    }

    #[test]
    fn orphan_encoder_defaults_to_positive() {
        let graph = sanitize(&json!({
            "2": { "class_type": "CLIPTextEncode", "inputs": { "text": "lonely" } }
        }))
        .unwrap()
        .graph;
        let conns = resolve(&graph, NodeTypeRegistry::builtin());
        assert_eq!(classify_prompt("2", &conns), PromptKind::Positive);
    }

    #[test]
    fn steps_sum_across_samplers() {
        let graph = sanitize(&json!({
            "1": { "class_type": "KSampler", "inputs": { "steps": 20, "cfg": 7 } },
            "2": { "class_type": "KSamplerAdvanced", "inputs": { "steps": 10, "noise_seed": 5 } },
            "3": { "class_type": "KSampler", "inputs": { "steps": ["9", 0] } }
        }))
        .unwrap()
        .graph;
        let chain = extract_sampler_chain(&graph);
        assert_eq!(chain.len(), 3);
        assert_eq!(total_steps(&chain), 30);
        assert_eq!(chain[1].seed, Some(5));
        assert_eq!(chain[2].steps, None);
        assert_eq!(chain[0].denoise, 1.0);
    }

    #[test]
    fn out_of_range_steps_saturate() {
        let graph = sanitize(&json!({
            "1": { "class_type": "KSampler", "inputs": { "steps": 1e300 } },
            "2": { "class_type": "KSampler", "inputs": { "steps": 1e300 } },
            "3": { "class_type": "KSamplerAdvanced", "inputs": { "steps": u64::MAX } }
        }))
        .unwrap()
        .graph;
        let chain = extract_sampler_chain(&graph);
        assert_eq!(chain[0].steps, Some(i64::MAX as u64));
        assert_eq!(total_steps(&chain), u64::MAX);
    }

    #[test]
    fn sdxl_encoder_uses_global_text() {
        let graph = sanitize(&json!({
            "1": { "class_type": "CLIPTextEncodeSDXL", "inputs": { "text_g": "castle", "text_l": "stone" } },
            "2": { "class_type": "KSampler", "inputs": { "positive": ["1", 0] } }
        }))
        .unwrap()
        .graph;
        let conns = resolve(&graph, NodeTypeRegistry::builtin());
        let prompts = extract_prompts(&graph, &conns);
        assert_eq!(prompts[0].text, "castle");
    }
}
