//! petgraph-based directed view over resolved connections.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use super::RelationshipEdge;
use crate::parse::types::WorkflowGraph;

pub struct ConnectionGraph {
    /// Node weight is the node id; edge weight indexes the edge list it came from.
    pub graph: DiGraph<String, usize>,
    pub node_indices: HashMap<String, NodeIndex>,
}

impl ConnectionGraph {
    pub fn build(workflow: &WorkflowGraph, edges: &[RelationshipEdge]) -> Self {
        let mut graph = DiGraph::with_capacity(workflow.len(), edges.len());
        let mut node_indices = HashMap::with_capacity(workflow.len());

        for id in workflow.ids() {
            let idx = graph.add_node(id.to_string());
            node_indices.insert(id.to_string(), idx);
        }

        for (i, edge) in edges.iter().enumerate() {
            let source = node_indices.get(&edge.from_node);
            let target = node_indices.get(&edge.to_node);
            if let (Some(&s), Some(&t)) = (source, target) {
                graph.add_edge(s, t, i);
            }
        }

        ConnectionGraph {
            graph,
            node_indices,
        }
    }

    /// Distinct nodes feeding `node_id`, in graph order.
    pub fn upstream(&self, node_id: &str) -> Vec<&str> {
        self.neighbors(node_id, Direction::Incoming)
    }

    /// Distinct nodes fed by `node_id`, in graph order.
    pub fn downstream(&self, node_id: &str) -> Vec<&str> {
        self.neighbors(node_id, Direction::Outgoing)
    }

    fn neighbors(&self, node_id: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };
        self.distinct(idx, direction)
            .into_iter()
            .map(|n| self.graph[n].as_str())
            .collect()
    }

    /// A node on a cycle, if the connections are cyclic.
    pub fn find_cycle(&self) -> Option<&str> {
        match toposort(&self.graph, None) {
            Ok(_) => None,
            Err(cycle) => Some(self.graph[cycle.node_id()].as_str()),
        }
    }

    /// Node ids in a valid execution order; among ready nodes the earliest in
    /// graph order runs first. Falls back to graph order when the connections
    /// contain a cycle.
    pub fn execution_order(&self) -> Vec<&str> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|i| self.upstream_indices(i).len())
            .collect();
        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|i| in_degree[i.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(idx)) = ready.pop() {
            order.push(self.graph[idx].as_str());
            for next in self.downstream_indices(idx) {
                in_degree[next.index()] -= 1;
                if in_degree[next.index()] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() < self.graph.node_count() {
            return self.graph.node_indices().map(|i| self.graph[i].as_str()).collect();
        }
        order
    }

    fn upstream_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.distinct(idx, Direction::Incoming)
    }

    fn downstream_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.distinct(idx, Direction::Outgoing)
    }

    fn distinct(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut found: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}
