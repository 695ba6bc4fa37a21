//! Search options and request payload building

use crate::PraxosError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Default number of hits requested
pub const DEFAULT_TOP_K: usize = 10;

/// Default anchor neighbourhood radius, in hops
pub const DEFAULT_ANCHOR_MAX_HOPS: u32 = 2;

/// Search strategy run by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchModality {
    /// Vector-only search with basic filtering
    #[default]
    Fast,
    /// Graph-aware node search with relationship traversal
    NodeVec,
    /// Edge/context search
    VecEdge,
    /// Search with server-side type inference
    TypeVec,
}

impl SearchModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchModality::Fast => "fast",
            SearchModality::NodeVec => "node_vec",
            SearchModality::VecEdge => "vec_edge",
            SearchModality::TypeVec => "type_vec",
        }
    }
}

impl fmt::Display for SearchModality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchModality {
    type Err = PraxosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fast" => Ok(SearchModality::Fast),
            "node_vec" => Ok(SearchModality::NodeVec),
            "vec_edge" => Ok(SearchModality::VecEdge),
            "type_vec" => Ok(SearchModality::TypeVec),
            other => Err(PraxosError::validation(format!(
                "unknown search modality '{}' (expected fast, node_vec, vec_edge or type_vec)",
                other
            ))),
        }
    }
}

/// Kind of graph node a search can be narrowed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Entity,
    Literal,
    EdgeSentence,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Entity => "entity",
            NodeKind::Literal => "literal",
            NodeKind::EdgeSentence => "edge_sentence",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Restricts node search to TimePoint nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalFilter {
    /// e.g. "Quarter", "Month"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timepoint_type: Option<String>,
    /// e.g. "2023-Q4", "January"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_period: Option<String>,
}

impl TemporalFilter {
    /// Build a filter from whichever parts are given; `None` when neither is.
    pub fn from_parts(timepoint_type: Option<&str>, time_period: Option<&str>) -> Option<Self> {
        let filter = Self {
            timepoint_type: non_empty(timepoint_type),
            time_period: non_empty(time_period),
        };
        (!filter.is_empty()).then_some(filter)
    }

    pub fn is_empty(&self) -> bool {
        self.timepoint_type.is_none() && self.time_period.is_none()
    }
}

/// A known graph node used to constrain search to its neighbourhood.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// Exact node id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Node type, e.g. "PhoneType" or "schema:Person"
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Literal value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// "entity" or "literal"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Anchor {
    /// Anchor on an exact node id
    pub fn element(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Anchor on a literal value of the given type
    pub fn literal(value: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            node_type: Some(node_type.into()),
            ..Default::default()
        }
    }

    pub fn phone(phone: impl Into<String>) -> Self {
        Self::literal(phone, "PhoneType")
    }

    pub fn email(email: impl Into<String>) -> Self {
        Self::literal(email, "EmailType")
    }
}

/// Optional knobs for a search.
///
/// Every filter left unset (or set to an empty string) is omitted from the
/// request rather than sent as null.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Number of hits to return
    pub top_k: usize,
    /// Ask the server to attach graph context to each hit
    pub include_graph_context: bool,
    /// Only hits from this source
    pub source_id: Option<String>,

    // Edge filters
    pub source_type: Option<String>,
    pub target_type: Option<String>,
    pub source_label: Option<String>,
    pub target_label: Option<String>,
    pub source_type_oid: Option<String>,
    pub target_type_oid: Option<String>,
    pub relationship_type: Option<String>,
    pub relationship_label: Option<String>,

    // Node filters
    /// e.g. "schema:Person"
    pub node_type: Option<String>,
    pub node_label: Option<String>,
    /// "entity", "literal" or "edge_sentence"
    pub node_kind: Option<String>,
    /// Only nodes that have (or lack) generated sentences
    pub has_sentence: Option<bool>,

    pub temporal_filter: Option<TemporalFilter>,

    /// Constrain results to the neighbourhood of these nodes
    pub known_anchors: Vec<Anchor>,
    /// Neighbourhood radius; only sent together with anchors
    pub anchor_max_hops: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            include_graph_context: true,
            source_id: None,
            source_type: None,
            target_type: None,
            source_label: None,
            target_label: None,
            source_type_oid: None,
            target_type_oid: None,
            relationship_type: None,
            relationship_label: None,
            node_type: None,
            node_label: None,
            node_kind: None,
            has_sentence: None,
            temporal_filter: None,
            known_anchors: Vec::new(),
            anchor_max_hops: DEFAULT_ANCHOR_MAX_HOPS,
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top_k(top_k: usize) -> Self {
        Self {
            top_k,
            ..Default::default()
        }
    }

    pub fn with_node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    pub fn with_node_kind(mut self, kind: NodeKind) -> Self {
        self.node_kind = Some(kind.as_str().to_string());
        self
    }

    pub fn with_has_sentence(mut self, has_sentence: bool) -> Self {
        self.has_sentence = Some(has_sentence);
        self
    }

    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn with_temporal_filter(mut self, filter: TemporalFilter) -> Self {
        self.temporal_filter = Some(filter);
        self
    }

    pub fn with_anchors(mut self, anchors: Vec<Anchor>, max_hops: u32) -> Self {
        self.known_anchors = anchors;
        self.anchor_max_hops = max_hops;
        self
    }
}

/// Body of `POST /search`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPayload {
    pub query: String,
    pub environment_id: String,
    pub search_modality: SearchModality,
    pub top_k: usize,
    pub include_graph_context: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type_oid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type_oid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_sentence: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal_filter: Option<TemporalFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_anchors: Option<Vec<Anchor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_max_hops: Option<u32>,
}

impl SearchPayload {
    pub fn build(
        environment_id: &str,
        query: &str,
        modality: SearchModality,
        options: &SearchOptions,
    ) -> Self {
        let has_anchors = !options.known_anchors.is_empty();
        Self {
            query: query.to_string(),
            environment_id: environment_id.to_string(),
            search_modality: modality,
            top_k: options.top_k,
            include_graph_context: options.include_graph_context,
            source_id: non_empty(options.source_id.as_deref()),
            target_type: non_empty(options.target_type.as_deref()),
            source_type: non_empty(options.source_type.as_deref()),
            target_label: non_empty(options.target_label.as_deref()),
            source_label: non_empty(options.source_label.as_deref()),
            target_type_oid: non_empty(options.target_type_oid.as_deref()),
            source_type_oid: non_empty(options.source_type_oid.as_deref()),
            relationship_type: non_empty(options.relationship_type.as_deref()),
            relationship_label: non_empty(options.relationship_label.as_deref()),
            node_type: non_empty(options.node_type.as_deref()),
            node_label: non_empty(options.node_label.as_deref()),
            node_kind: non_empty(options.node_kind.as_deref()),
            has_sentence: options.has_sentence,
            temporal_filter: options
                .temporal_filter
                .clone()
                .filter(|f| !f.is_empty()),
            known_anchors: has_anchors.then(|| options.known_anchors.clone()),
            anchor_max_hops: has_anchors.then_some(options.anchor_max_hops),
        }
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Score of a hit; missing or non-numeric scores count as 0.
pub fn score_of(hit: &Value) -> f64 {
    hit.get("score").and_then(Value::as_f64).unwrap_or(0.0)
}

/// Concatenate hit batches, order by descending score and keep `top_k`.
///
/// The sort is stable: equal scores keep batch order, then hit order.
pub fn merge_by_score<I>(batches: I, top_k: usize) -> Vec<Value>
where
    I: IntoIterator<Item = Vec<Value>>,
{
    let mut hits: Vec<Value> = batches.into_iter().flatten().collect();
    hits.sort_by(|a, b| score_of(b).total_cmp(&score_of(a)));
    hits.truncate(top_k);
    hits
}
