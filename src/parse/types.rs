//! Sanitized workflow graph types.
//!
//! Everything here is produced by the sanitizer and read by later phases.
//! Port values are tagged once (literal vs connection) so no later phase
//! inspects raw JSON arrays to decide what an input is.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// PORT VALUES
// =============================================================================

/// Output slot of a connection reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Index(usize),
    /// Negative, fractional or non-numeric; kept for reporting.
    Malformed(Value),
}

impl Slot {
    pub fn index(&self) -> Option<usize> {
        match self {
            Slot::Index(i) => Some(*i),
            Slot::Malformed(_) => None,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Index(i) => write!(f, "{}", i),
            Slot::Malformed(v) => write!(f, "{}", v),
        }
    }
}

/// Reference from an input port to output `slot` of node `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRef {
    pub source: String,
    pub slot: Slot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PortValue {
    Literal(Value),
    Connection(ConnectionRef),
}

impl PortValue {
    /// Tag a raw input value. A two-element array whose first element is a
    /// string or integer id is a connection; anything else is a literal.
    pub fn from_raw(raw: &Value) -> PortValue {
        let Some([id, slot]) = raw.as_array().map(Vec::as_slice) else {
            return PortValue::Literal(raw.clone());
        };
        let source = match id {
            Value::String(s) => s.clone(),
            Value::Number(n) if n.is_u64() || n.is_i64() => n.to_string(),
            _ => return PortValue::Literal(raw.clone()),
        };
        let slot = match slot.as_u64().and_then(|i| usize::try_from(i).ok()) {
            Some(i) => Slot::Index(i),
            None => Slot::Malformed(slot.clone()),
        };
        PortValue::Connection(ConnectionRef { source, slot })
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            PortValue::Literal(v) => Some(v),
            PortValue::Connection(_) => None,
        }
    }

    pub fn as_connection(&self) -> Option<&ConnectionRef> {
        match self {
            PortValue::Connection(c) => Some(c),
            PortValue::Literal(_) => None,
        }
    }
}

// =============================================================================
// NODE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub class_type: String,
    pub inputs: BTreeMap<String, PortValue>,
    pub title: Option<String>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub color: Option<String>,
}

impl Node {
    pub fn new(class_type: &str) -> Self {
        Node {
            class_type: class_type.into(),
            inputs: BTreeMap::new(),
            title: None,
            position: None,
            size: None,
            color: None,
        }
    }

    /// Builder-style helper used by tests and embedders assembling graphs by hand.
    pub fn with_input(mut self, name: &str, value: PortValue) -> Self {
        self.inputs.insert(name.into(), value);
        self
    }

    pub fn literal(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name).and_then(PortValue::as_literal)
    }

    pub fn connection(&self, name: &str) -> Option<&ConnectionRef> {
        self.inputs.get(name).and_then(PortValue::as_connection)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.literal(name).and_then(Value::as_f64)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        let value = self.literal(name)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.literal(name).and_then(Value::as_str)
    }

    /// Literal prompt strings: `text`, then the SDXL `text_g`/`text_l` pair.
    pub fn prompt_texts(&self) -> impl Iterator<Item = &str> {
        ["text", "text_g", "text_l"]
            .into_iter()
            .filter_map(|name| self.string(name))
    }

    /// All connection inputs, in input-name order.
    pub fn connections(&self) -> impl Iterator<Item = (&str, &ConnectionRef)> {
        self.inputs
            .iter()
            .filter_map(|(name, v)| v.as_connection().map(|c| (name.as_str(), c)))
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// Numeric ids ascend numerically and come first; other ids follow in
/// lexicographic order.
pub fn compare_node_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Sanitized workflow: node id → node, iterated in id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowGraph {
    nodes: HashMap<String, Node>,
    order: Vec<String>,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = (String, Node)>) -> Self {
        let nodes: HashMap<String, Node> = nodes.into_iter().collect();
        let mut order: Vec<String> = nodes.keys().cloned().collect();
        order.sort_by(|a, b| compare_node_ids(a, b));
        WorkflowGraph { nodes, order }
    }

    /// Insert or replace a node.
    pub fn insert(&mut self, id: &str, node: Node) {
        if self.nodes.insert(id.to_string(), node).is_none() {
            let pos = self
                .order
                .binary_search_by(|probe| compare_node_ids(probe, id))
                .unwrap_or_else(|p| p);
            self.order.insert(pos, id.to_string());
        }
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.order
            .iter()
            .filter_map(|id| self.nodes.get(id).map(|n| (id.as_str(), n)))
    }

    /// Position of `id` in iteration order.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.order
            .binary_search_by(|probe| compare_node_ids(probe, id))
            .ok()
    }

    /// Nodes whose class type satisfies `pred`, in id order.
    pub fn nodes_where<'a>(
        &'a self,
        pred: impl Fn(&str) -> bool + 'a,
    ) -> impl Iterator<Item = (&'a str, &'a Node)> + 'a {
        self.iter().filter(move |(_, n)| pred(&n.class_type))
    }
}
