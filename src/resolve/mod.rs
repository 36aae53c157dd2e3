//! Connection resolution: every connection reference → a typed relationship
//! edge.
//!
//! [`Connections`] is the only place later phases ask "is this port connected"
//! or "what feeds what".

pub mod graph;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use graph::ConnectionGraph;

use crate::parse::types::WorkflowGraph;
use crate::registry::{NodeTypeRegistry, OutputDescriptor};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEdge {
    pub from_node: String,
    /// `None` when the reference carried a malformed index.
    pub from_output_index: Option<usize>,
    pub from_output_name: String,
    pub from_output_type: String,
    pub to_node: String,
    pub to_input_name: String,
    /// Whether the destination input is required by its node's schema.
    pub required: bool,
}

pub struct Connections {
    edges: Vec<RelationshipEdge>,
    /// (to_node, to_input) → edge index
    by_input: HashMap<(String, String), usize>,
    graph: ConnectionGraph,
}

/// Resolve every connection whose source exists. Dangling references produce
/// no edge; the validator reports them.
pub fn resolve(workflow: &WorkflowGraph, registry: &NodeTypeRegistry) -> Connections {
    let mut edges = Vec::new();

    for (to_id, node) in workflow.iter() {
        for (input, conn) in node.connections() {
            let Some(source) = workflow.get(&conn.source) else {
                continue;
            };
            let output = conn
                .slot
                .index()
                .and_then(|i| registry.output(&source.class_type, i))
                .cloned()
                .unwrap_or_else(OutputDescriptor::unknown);

            edges.push(RelationshipEdge {
                from_node: conn.source.clone(),
                from_output_index: conn.slot.index(),
                from_output_name: output.name,
                from_output_type: output.data_type,
                to_node: to_id.to_string(),
                to_input_name: input.to_string(),
                required: registry.is_required(&node.class_type, input),
            });
        }
    }

    Connections::new(workflow, edges)
}

impl Connections {
    fn new(workflow: &WorkflowGraph, edges: Vec<RelationshipEdge>) -> Self {
        let by_input = edges
            .iter()
            .enumerate()
            .map(|(i, e)| ((e.to_node.clone(), e.to_input_name.clone()), i))
            .collect();
        let graph = ConnectionGraph::build(workflow, &edges);
        Connections {
            edges,
            by_input,
            graph,
        }
    }

    pub fn edges(&self) -> &[RelationshipEdge] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<RelationshipEdge> {
        self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn graph(&self) -> &ConnectionGraph {
        &self.graph
    }

    pub fn is_connected(&self, node_id: &str, input: &str) -> bool {
        self.source_of(node_id, input).is_some()
    }

    /// The edge feeding `input` of `node_id`, if it resolved.
    pub fn source_of(&self, node_id: &str, input: &str) -> Option<&RelationshipEdge> {
        self.by_input
            .get(&(node_id.to_string(), input.to_string()))
            .map(|&i| &self.edges[i])
    }

    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a RelationshipEdge> + 'a {
        self.edges.iter().filter(move |e| e.to_node == node_id)
    }

    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a RelationshipEdge> + 'a {
        self.edges.iter().filter(move |e| e.from_node == node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::sanitize;
    use serde_json::json;

    fn graph(raw: serde_json::Value) -> WorkflowGraph {
        sanitize(&raw).unwrap().graph
    }

    #[test]
    fn resolves_registered_outputs() {
        let g = graph(json!({
            "1": { "class_type": "CheckpointLoaderSimple", "inputs": { "ckpt_name": "m.safetensors" } },
            "2": { "class_type": "VAEDecode", "inputs": { "samples": ["3", 0], "vae": ["1", 2] } }
        }));
        let conns = resolve(&g, NodeTypeRegistry::builtin());
        assert_eq!(conns.len(), 1);
        let edge = conns.source_of("2", "vae").expect("vae resolved");
        assert_eq!(edge.from_output_name, "VAE");
        assert_eq!(edge.from_output_type, "VAE");
        assert!(edge.required);
        assert!(!conns.is_connected("2", "samples"));
    }

    #[test]
    fn unknown_type_or_slot_gets_placeholder() {
        let g = graph(json!({
            "1": { "class_type": "CustomThing", "inputs": {} },
            "2": { "class_type": "CheckpointLoaderSimple", "inputs": { "ckpt_name": "m.safetensors" } },
            "3": { "class_type": "MyNode", "inputs": { "a": ["1", 0], "b": ["2", 9], "c": ["2", -1] } }
        }));
        let conns = resolve(&g, NodeTypeRegistry::builtin());
        assert_eq!(conns.len(), 3);
        for edge in conns.edges() {
            assert_eq!(edge.from_output_name, "unknown");
            assert_eq!(edge.from_output_type, "unknown");
            assert!(!edge.required);
        }
        assert_eq!(conns.source_of("3", "c").unwrap().from_output_index, None);
    }

    #[test]
    fn resolution_is_deterministic() {
        let g = graph(json!({
            "1": { "class_type": "CheckpointLoaderSimple", "inputs": { "ckpt_name": "m.safetensors" } },
            "2": { "class_type": "CLIPTextEncode", "inputs": { "text": "x", "clip": ["1", 1] } },
            "3": { "class_type": "CLIPTextEncode", "inputs": { "text": "y", "clip": ["1", 1] } }
        }));
        let a = resolve(&g, NodeTypeRegistry::builtin()).into_edges();
        let b = resolve(&g, NodeTypeRegistry::builtin()).into_edges();
        assert_eq!(a, b);
    }

    #[test]
    fn graph_view_neighbors_and_order() {
        let g = graph(json!({
            "1": { "class_type": "CheckpointLoaderSimple", "inputs": { "ckpt_name": "m.safetensors" } },
            "2": { "class_type": "CLIPTextEncode", "inputs": { "text": "x", "clip": ["1", 1] } },
            "3": { "class_type": "KSampler", "inputs": { "model": ["1", 0], "positive": ["2", 0], "negative": ["2", 0] } }
        }));
        let conns = resolve(&g, NodeTypeRegistry::builtin());
        assert_eq!(conns.graph().upstream("3"), vec!["1", "2"]);
        assert_eq!(conns.graph().downstream("1"), vec!["2", "3"]);
        assert_eq!(conns.graph().execution_order(), vec!["1", "2", "3"]);
        assert!(conns.graph().find_cycle().is_none());
    }

    #[test]
    fn execution_order_prefers_graph_order_among_ready_nodes() {
        let g = graph(json!({
            "1": { "class_type": "CheckpointLoaderSimple", "inputs": { "ckpt_name": "m.safetensors" } },
            "2": { "class_type": "CLIPTextEncode", "inputs": { "text": "x", "clip": ["1", 1] } },
            "3": { "class_type": "Mystery", "inputs": {} },
            "4": { "class_type": "CLIPTextEncode", "inputs": { "text": "y", "clip": ["1", 1] } }
        }));
        let conns = resolve(&g, NodeTypeRegistry::builtin());
        assert_eq!(conns.graph().execution_order(), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn cycle_detected() {
        let g = graph(json!({
            "1": { "class_type": "A", "inputs": { "x": ["2", 0] } },
            "2": { "class_type": "B", "inputs": { "x": ["1", 0] } }
        }));
        let conns = resolve(&g, NodeTypeRegistry::builtin());
        assert!(conns.graph().find_cycle().is_some());
        assert_eq!(conns.graph().execution_order(), vec!["1", "2"]);
    }
}
