//! Node-link graph model for graph ingestion
//!
//! Graphs are sent to the server in the node-link layout used by networkx:
//!
//! ```json
//! {"directed": true, "multigraph": true, "graph": {},
//!  "nodes": [{"id": "person_1", "type": "schema:Person"}],
//!  "links": [{"source": "person_1", "target": "org_1", "key": 0, "type": "WORKS_AT"}]}
//! ```

use crate::PraxosError;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Directedness and edge multiplicity of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    Graph,
    DiGraph,
    MultiGraph,
    MultiDiGraph,
}

impl GraphKind {
    pub fn from_flags(directed: bool, multigraph: bool) -> Self {
        match (directed, multigraph) {
            (false, false) => GraphKind::Graph,
            (true, false) => GraphKind::DiGraph,
            (false, true) => GraphKind::MultiGraph,
            (true, true) => GraphKind::MultiDiGraph,
        }
    }

    pub fn is_directed(&self) -> bool {
        matches!(self, GraphKind::DiGraph | GraphKind::MultiDiGraph)
    }

    pub fn is_multigraph(&self) -> bool {
        matches!(self, GraphKind::MultiGraph | GraphKind::MultiDiGraph)
    }
}

#[derive(Debug, Clone)]
struct Node {
    id: Value,
    attrs: Map<String, Value>,
}

#[derive(Debug, Clone)]
struct Edge {
    source: Value,
    target: Value,
    key: Option<Value>,
    attrs: Map<String, Value>,
}

/// An attributed graph with JSON node ids.
#[derive(Debug, Clone)]
pub struct Graph {
    kind: GraphKind,
    attrs: Map<String, Value>,
    nodes: Vec<Node>,
    /// JSON rendering of a node id → position in `nodes`
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new(kind: GraphKind) -> Self {
        Self {
            kind,
            attrs: Map::new(),
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Set a graph-level attribute
    pub fn set_attr(&mut self, key: impl Into<String>, value: Value) {
        self.attrs.insert(key.into(), value);
    }

    /// Add a node, or merge `attrs` into an existing node with the same id.
    pub fn add_node(&mut self, id: impl Into<Value>, attrs: Map<String, Value>) {
        let id = id.into();
        let slot = id.to_string();
        match self.index.get(&slot) {
            Some(&pos) => self.nodes[pos].attrs.extend(attrs),
            None => {
                self.index.insert(slot, self.nodes.len());
                self.nodes.push(Node { id, attrs });
            }
        }
    }

    /// Add an edge, creating missing endpoints.
    ///
    /// On simple graphs a repeated edge merges its attributes. On
    /// multigraphs every call adds a parallel edge keyed by the lowest unused
    /// integer for that endpoint pair. Returns the edge key for multigraphs.
    pub fn add_edge(
        &mut self,
        source: impl Into<Value>,
        target: impl Into<Value>,
        attrs: Map<String, Value>,
    ) -> Option<Value> {
        self.insert_edge(source.into(), target.into(), None, attrs)
    }

    /// Add a multigraph edge with an explicit key. On simple graphs the key
    /// is ignored.
    pub fn add_keyed_edge(
        &mut self,
        source: impl Into<Value>,
        target: impl Into<Value>,
        key: impl Into<Value>,
        attrs: Map<String, Value>,
    ) -> Option<Value> {
        self.insert_edge(source.into(), target.into(), Some(key.into()), attrs)
    }

    fn insert_edge(
        &mut self,
        source: Value,
        target: Value,
        key: Option<Value>,
        attrs: Map<String, Value>,
    ) -> Option<Value> {
        self.add_node(source.clone(), Map::new());
        self.add_node(target.clone(), Map::new());

        let directed = self.kind.is_directed();
        let same_pair = |edge: &Edge| {
            (edge.source == source && edge.target == target)
                || (!directed && edge.source == target && edge.target == source)
        };

        if !self.kind.is_multigraph() {
            match self.edges.iter_mut().find(|e| same_pair(e)) {
                Some(existing) => existing.attrs.extend(attrs),
                None => self.edges.push(Edge {
                    source,
                    target,
                    key: None,
                    attrs,
                }),
            }
            return None;
        }

        let used: Vec<&Value> = self
            .edges
            .iter()
            .filter(|e| same_pair(e))
            .filter_map(|e| e.key.as_ref())
            .collect();
        let key = match key {
            Some(key) => key,
            None => {
                let mut next = used.len() as u64;
                while used.iter().any(|k| k.as_u64() == Some(next)) {
                    next += 1;
                }
                Value::from(next)
            }
        };

        match self
            .edges
            .iter_mut()
            .find(|e| same_pair(e) && e.key.as_ref() == Some(&key))
        {
            Some(existing) => existing.attrs.extend(attrs),
            None => self.edges.push(Edge {
                source,
                target,
                key: Some(key.clone()),
                attrs,
            }),
        }
        Some(key)
    }

    /// Serialize to the node-link layout
    pub fn node_link_data(&self) -> Value {
        let nodes: Vec<Value> = self
            .nodes
            .iter()
            .map(|node| {
                let mut entry = node.attrs.clone();
                entry.insert("id".to_string(), node.id.clone());
                Value::Object(entry)
            })
            .collect();

        let links: Vec<Value> = self
            .edges
            .iter()
            .map(|edge| {
                let mut entry = edge.attrs.clone();
                entry.insert("source".to_string(), edge.source.clone());
                entry.insert("target".to_string(), edge.target.clone());
                if let Some(key) = &edge.key {
                    entry.insert("key".to_string(), key.clone());
                }
                Value::Object(entry)
            })
            .collect();

        serde_json::json!({
            "directed": self.kind.is_directed(),
            "multigraph": self.kind.is_multigraph(),
            "graph": self.attrs,
            "nodes": nodes,
            "links": links,
        })
    }

    /// Parse a node-link document produced elsewhere.
    ///
    /// Fails unless the value is an object with boolean `directed` and
    /// `multigraph`, array `nodes` of objects carrying an `id`, and array
    /// `links` of objects carrying `source` and `target`.
    pub fn from_node_link(value: &Value) -> crate::Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| invalid("expected a JSON object"))?;
        let directed = obj
            .get("directed")
            .and_then(Value::as_bool)
            .ok_or_else(|| invalid("missing boolean 'directed'"))?;
        let multigraph = obj
            .get("multigraph")
            .and_then(Value::as_bool)
            .ok_or_else(|| invalid("missing boolean 'multigraph'"))?;
        let nodes = obj
            .get("nodes")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("missing array 'nodes'"))?;
        let links = obj
            .get("links")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("missing array 'links'"))?;

        let mut graph = Graph::new(GraphKind::from_flags(directed, multigraph));
        if let Some(Value::Object(attrs)) = obj.get("graph") {
            graph.attrs = attrs.clone();
        }

        for node in nodes {
            let mut attrs = node
                .as_object()
                .cloned()
                .ok_or_else(|| invalid("every node must be an object"))?;
            let id = attrs
                .remove("id")
                .ok_or_else(|| invalid("every node needs an 'id'"))?;
            graph.add_node(id, attrs);
        }

        for link in links {
            let mut attrs = link
                .as_object()
                .cloned()
                .ok_or_else(|| invalid("every link must be an object"))?;
            let source = attrs
                .remove("source")
                .ok_or_else(|| invalid("every link needs a 'source'"))?;
            let target = attrs
                .remove("target")
                .ok_or_else(|| invalid("every link needs a 'target'"))?;
            let key = attrs.remove("key");
            graph.insert_edge(source, target, key, attrs);
        }

        Ok(graph)
    }
}

fn invalid(reason: &str) -> PraxosError {
    PraxosError::validation(format!("graph must be a node-link graph object: {}", reason))
}
