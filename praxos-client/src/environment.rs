//! Environment resource handle: search, extraction and ingestion

use crate::client::{Client, FilePart, RequestBody};
use crate::response::{parse_list, parse_record, take_array};
use crate::source::Source;
use praxos_core::{
    merge_by_score, Anchor, Context, ContextResult, ConversationEntry, EnvironmentRecord,
    ExtractScope, Graph, IngestOptions, LiteralMode, NodeKind, PraxosError, Result,
    Schema, SearchModality, SearchOptions, SearchPayload, SourceRecord, TemporalFilter,
    DEFAULT_ROOT_ENTITY_TYPE,
};
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// File extensions accepted by `add_file`, with the content type sent
pub const SUPPORTED_FILE_TYPES: [(&str, &str); 2] =
    [("pdf", "application/pdf"), ("json", "application/json")];

/// Query used by phone/email anchor searches when none is given
pub const DEFAULT_ANCHOR_QUERY: &str = "related entities";

/// A named workspace, borrowed from the `Client` that fetched it.
pub struct Environment<'c> {
    client: &'c Client,
    record: EnvironmentRecord,
}

impl<'c> Environment<'c> {
    pub(crate) fn new(client: &'c Client, record: EnvironmentRecord) -> Self {
        Self { client, record }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn created_at(&self) -> &str {
        &self.record.created_at
    }

    pub fn description(&self) -> &str {
        &self.record.description
    }

    pub fn record(&self) -> &EnvironmentRecord {
        &self.record
    }

    pub fn into_record(self) -> EnvironmentRecord {
        self.record
    }

    fn post(&self, path: &str, query: &[(&str, &str)], body: Value) -> Result<Value> {
        self.client
            .request(Method::POST, path, query, RequestBody::Json(body))
    }

    fn source_from(&self, response: Value) -> Result<Source<'c>> {
        let record: SourceRecord = parse_record(response, "source")?;
        Ok(Source::new(self.client, record))
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Run one search and return its hits.
    ///
    /// Only filters set in `options` are sent.
    pub fn search(
        &self,
        query: &str,
        modality: SearchModality,
        options: &SearchOptions,
    ) -> Result<Vec<Value>> {
        let payload = SearchPayload::build(&self.record.id, query, modality, options);
        let preview: String = query.chars().take(50).collect();
        info!(
            query = %preview,
            modality = %modality,
            top_k = options.top_k,
            "starting search"
        );

        let started = Instant::now();
        let response = self.post("/search", &[], serde_json::to_value(&payload)?)?;
        let hits = take_array(response, "hits");

        info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            hits = hits.len(),
            "search completed"
        );
        Ok(hits)
    }

    /// Vector-only search, optimised for speed
    pub fn search_fast(&self, query: &str, options: &SearchOptions) -> Result<Vec<Value>> {
        self.search(query, SearchModality::Fast, options)
    }

    /// Graph-aware search with relationship traversal
    pub fn search_graph(&self, query: &str, options: &SearchOptions) -> Result<Vec<Value>> {
        self.search(query, SearchModality::NodeVec, options)
    }

    /// Search with server-side inference of source and target types
    pub fn search_with_types(&self, query: &str, top_k: usize) -> Result<Vec<Value>> {
        self.search(query, SearchModality::TypeVec, &SearchOptions::top_k(top_k))
    }

    /// Search entities that have generated sentences.
    ///
    /// With several `entity_types`, runs one search per type and merges the
    /// hits by descending score.
    pub fn search_entities(
        &self,
        query: &str,
        entity_types: &[&str],
        top_k: usize,
    ) -> Result<Vec<Value>> {
        let base = SearchOptions::top_k(top_k)
            .with_node_kind(NodeKind::Entity)
            .with_has_sentence(true);

        if entity_types.is_empty() {
            return self.search(query, SearchModality::NodeVec, &base);
        }

        let batches = entity_types
            .iter()
            .map(|entity_type| {
                let options = base.clone().with_node_type(*entity_type);
                self.search(query, SearchModality::NodeVec, &options)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(merge_by_score(batches, top_k))
    }

    /// Search filtered to TimePoint nodes. The temporal filter is omitted
    /// when neither part is given.
    pub fn search_temporal(
        &self,
        query: &str,
        timepoint_type: Option<&str>,
        time_period: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<Value>> {
        let mut options = SearchOptions::top_k(top_k);
        options.temporal_filter = TemporalFilter::from_parts(timepoint_type, time_period);
        self.search(query, SearchModality::NodeVec, &options)
    }

    /// Search generated sentences across node kinds, merging by score.
    ///
    /// Defaults to entity and edge-sentence nodes.
    pub fn search_sentences(
        &self,
        query: &str,
        kinds: &[NodeKind],
        top_k: usize,
    ) -> Result<Vec<Value>> {
        let kinds: &[NodeKind] = if kinds.is_empty() {
            &[NodeKind::Entity, NodeKind::EdgeSentence]
        } else {
            kinds
        };

        let batches = kinds
            .iter()
            .map(|kind| {
                let options = SearchOptions::top_k(top_k)
                    .with_node_kind(*kind)
                    .with_has_sentence(true);
                self.search(query, SearchModality::NodeVec, &options)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(merge_by_score(batches, top_k))
    }

    /// Graph search restricted to within `max_hops` of the anchors
    pub fn search_from_anchors(
        &self,
        anchors: Vec<Anchor>,
        query: &str,
        max_hops: u32,
        options: &SearchOptions,
    ) -> Result<Vec<Value>> {
        let options = options.clone().with_anchors(anchors, max_hops);
        self.search(query, SearchModality::NodeVec, &options)
    }

    /// Graph search around one node id
    pub fn search_from_element(
        &self,
        element_id: &str,
        query: &str,
        max_hops: u32,
        options: &SearchOptions,
    ) -> Result<Vec<Value>> {
        self.search_from_anchors(vec![Anchor::element(element_id)], query, max_hops, options)
    }

    /// Graph search around a phone number literal. An empty query becomes
    /// `DEFAULT_ANCHOR_QUERY`.
    pub fn search_from_phone(
        &self,
        phone: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Value>> {
        self.search_from_anchors(
            vec![Anchor::phone(phone)],
            anchor_query(query),
            options.anchor_max_hops,
            options,
        )
    }

    /// Graph search around an email address literal. An empty query becomes
    /// `DEFAULT_ANCHOR_QUERY`.
    pub fn search_from_email(
        &self,
        email: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Value>> {
        self.search_from_anchors(
            vec![Anchor::email(email)],
            anchor_query(query),
            options.anchor_max_hops,
            options,
        )
    }

    /// Context for an LLM, from edge search.
    ///
    /// `top_k == 1` returns the best hit alone; otherwise up to `top_k` hits.
    /// `top_k == 0` returns every hit the server sent.
    pub fn get_context(&self, query: &str, top_k: usize) -> Result<ContextResult> {
        let response = self.post(
            "/search",
            &[],
            json!({
                "query": query,
                "top_k": top_k,
                "environment_id": self.record.id,
                "search_modality": SearchModality::VecEdge,
            }),
        )?;

        let mut contexts = take_array(response, "hits")
            .into_iter()
            .map(|hit| parse_record::<Context>(hit, "context hit"))
            .collect::<Result<Vec<_>>>()?;

        if top_k == 1 {
            return match contexts.into_iter().next() {
                Some(context) => Ok(ContextResult::Single(context)),
                None => Err(PraxosError::InvalidResponse(
                    "search returned no context hits".to_string(),
                )),
            };
        }
        if top_k > 0 {
            contexts.truncate(top_k);
        }
        Ok(ContextResult::Many(contexts))
    }

    /// Fetch graph nodes with their properties and literals
    pub fn fetch_graph_nodes<S: AsRef<str>>(&self, node_ids: &[S]) -> Result<Vec<Value>> {
        let node_ids: Vec<&str> = node_ids.iter().map(AsRef::as_ref).collect();
        let response = self.post(
            "/fetch-graph-nodes",
            &[],
            json!({ "node_ids": node_ids, "environment_id": self.record.id }),
        )?;
        Ok(take_array(response, "results"))
    }

    // ------------------------------------------------------------------
    // Extraction
    // ------------------------------------------------------------------

    /// Extract entities labelled with `schema`
    pub fn extract_items(
        &self,
        schema: impl Into<Schema>,
        scope: &ExtractScope,
    ) -> Result<Vec<Value>> {
        let schema = schema.into();
        let mut payload = Map::new();
        payload.insert("extraction_type".to_string(), json!("entities"));
        payload.insert("label".to_string(), json!(schema.label()));
        payload.insert("environment_id".to_string(), json!(self.record.id));
        scope.write_into(&mut payload);

        let response = self.post("/extract", &[], Value::Object(payload))?;
        Ok(take_array(response, "items"))
    }

    /// Extract literals of one type, e.g. `EmailType`.
    ///
    /// `mode` must be `literals_only` or `full_entities`; anything else fails
    /// before a request is sent.
    pub fn extract_literals(
        &self,
        literal_type: &str,
        mode: &str,
        scope: &ExtractScope,
    ) -> Result<Value> {
        let mode: LiteralMode = mode.parse()?;
        let mut payload = Map::new();
        payload.insert("extraction_type".to_string(), json!("literals"));
        payload.insert("literal_type".to_string(), json!(literal_type));
        payload.insert("mode".to_string(), json!(mode.as_str()));
        payload.insert("environment_id".to_string(), json!(self.record.id));
        scope.write_into(&mut payload);

        self.post("/extract", &[], Value::Object(payload))
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Add a conversation source. Entries may be typed messages or raw
    /// `{"role", "content"}` maps.
    pub fn add_conversation<I, E>(
        &self,
        entries: I,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Source<'c>>
    where
        I: IntoIterator<Item = E>,
        E: Into<ConversationEntry>,
    {
        let entries: Vec<ConversationEntry> = entries.into_iter().map(Into::into).collect();
        if entries.is_empty() {
            return Err(PraxosError::validation("Messages must be a non-empty list"));
        }
        let messages = entries
            .into_iter()
            .map(|entry| entry.into_message().map(|m| m.to_value()))
            .collect::<Result<Vec<Value>>>()?;

        let mut payload = Map::new();
        payload.insert("messages".to_string(), Value::Array(messages));
        payload.insert("description".to_string(), json!(description));
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            payload.insert("name".to_string(), json!(name));
        }

        let response = self.post(
            "/sources",
            &[("type", "conversation"), ("environment_id", self.id())],
            Value::Object(payload),
        )?;
        self.source_from(response)
    }

    /// Upload a PDF or JSON file as a source.
    ///
    /// The source name defaults to the file name without its extension.
    pub fn add_file(
        &self,
        path: impl AsRef<Path>,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Source<'c>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PraxosError::FileNotFound(path.to_path_buf()));
        }

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let content_type = content_type_for(extension).ok_or_else(|| {
            let supported: Vec<&str> = SUPPORTED_FILE_TYPES.iter().map(|(ext, _)| *ext).collect();
            PraxosError::validation(format!(
                "File extension {} is not supported. Supported extensions are: {}",
                extension,
                supported.join(", ")
            ))
        })?;

        let name = match name {
            Some(name) => name.to_string(),
            None => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        let bytes = std::fs::read(path).map_err(|e| PraxosError::Api {
            status: 0,
            message: format!("File upload failed: {}", e),
        })?;

        let mut fields = vec![
            ("type".to_string(), "file".to_string()),
            ("name".to_string(), name.clone()),
        ];
        if let Some(description) = description {
            fields.push(("description".to_string(), description.to_string()));
        }
        let files = vec![FilePart {
            field: "file".to_string(),
            file_name: name,
            content_type,
            bytes,
        }];

        let response = self.client.request(
            Method::POST,
            "sources",
            &[("environment_id", self.id())],
            RequestBody::Multipart { fields, files },
        )?;
        self.source_from(response)
    }

    /// Add arbitrary JSON business data as a source.
    ///
    /// `root_entity_type` defaults to `schema:Thing`.
    pub fn add_business_data(
        &self,
        data: Value,
        root_entity_type: Option<&str>,
        options: &IngestOptions,
    ) -> Result<Source<'c>> {
        let mut payload = Map::new();
        payload.insert("data".to_string(), data);
        payload.insert(
            "root_entity_type".to_string(),
            json!(root_entity_type
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_ROOT_ENTITY_TYPE)),
        );
        options.write_into(&mut payload);

        let response = self.post(
            "/sources",
            &[("environment_id", self.id())],
            Value::Object(payload),
        )?;
        self.source_from(response)
    }

    /// Add a graph as a source, sent in node-link form.
    pub fn add_networkx_graph(&self, graph: &Graph, options: &IngestOptions) -> Result<Source<'c>> {
        let mut payload = Map::new();
        payload.insert("graph_data".to_string(), graph.node_link_data());
        options.write_into(&mut payload);

        let response = self.post(
            "/sources",
            &[("environment_id", self.id()), ("type", "networkx_graph")],
            Value::Object(payload),
        )?;
        self.source_from(response)
    }

    /// Add a graph given as an already-serialized node-link document.
    ///
    /// Fails without a request if `node_link` is not a node-link graph.
    pub fn add_node_link_graph(
        &self,
        node_link: &Value,
        options: &IngestOptions,
    ) -> Result<Source<'c>> {
        let graph = Graph::from_node_link(node_link)?;
        self.add_networkx_graph(&graph, options)
    }

    /// List the sources in this environment
    pub fn get_sources(&self) -> Result<Vec<Source<'c>>> {
        let response = self.client.request(
            Method::GET,
            "/sources",
            &[("environment_id", self.id())],
            RequestBody::Empty,
        )?;
        let records: Vec<SourceRecord> = parse_list(response, "sources")?;
        Ok(records
            .into_iter()
            .map(|record| Source::new(self.client, record))
            .collect())
    }

    /// Look up one source by id or, failing that, by name.
    pub fn get_source(&self, id: Option<&str>, name: Option<&str>) -> Result<Source<'c>> {
        let lookup = match (
            id.filter(|v| !v.is_empty()),
            name.filter(|v| !v.is_empty()),
        ) {
            (Some(id), _) => ("id", id),
            (None, Some(name)) => ("name", name),
            (None, None) => {
                return Err(PraxosError::validation(
                    "Either id or name must be provided",
                ))
            }
        };

        let response = self.client.request(
            Method::GET,
            "/sources",
            &[("environment_id", self.id()), lookup],
            RequestBody::Empty,
        )?;
        self.source_from(response)
    }
}

impl fmt::Display for Environment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Environment id='{}' name='{}'>",
            self.record.id, self.record.name
        )
    }
}

impl fmt::Debug for Environment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("record", &self.record)
            .finish()
    }
}

fn anchor_query(query: &str) -> &str {
    if query.is_empty() {
        DEFAULT_ANCHOR_QUERY
    } else {
        query
    }
}

fn content_type_for(extension: &str) -> Option<&'static str> {
    SUPPORTED_FILE_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, content_type)| *content_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxos_core::Message;

    #[test]
    fn test_content_type_allow_list() {
        assert_eq!(content_type_for("pdf"), Some("application/pdf"));
        assert_eq!(content_type_for("json"), Some("application/json"));
        assert_eq!(content_type_for("txt"), None);
        assert_eq!(content_type_for("PDF"), None);
    }

    #[test]
    fn test_anchor_query_default() {
        assert_eq!(anchor_query(""), DEFAULT_ANCHOR_QUERY);
        assert_eq!(anchor_query("owners"), "owners");
    }

    #[test]
    fn test_message_is_reexported_shape() {
        assert_eq!(
            Message::user("hi").to_value(),
            json!({"role": "user", "content": "hi"})
        );
    }
}
