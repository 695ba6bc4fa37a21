//! Praxos Core - Types for the Praxos knowledge-graph API
//!
//! This library holds everything the client needs that does not touch the
//! network: configuration, the error taxonomy, resource records, search
//! payload building, and the ingestion data models.

pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod graph;
pub mod message;
pub mod models;
pub mod search;

pub use config::{
    ClientConfig, ConfigFile, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, EXAMPLE_CONFIG, SDK_VERSION,
};
pub use context::{Context, ContextResult};
pub use error::PraxosError;
pub use extract::{ExtractScope, LiteralMode, Schema};
pub use graph::{Graph, GraphKind};
pub use message::{ConversationEntry, Message};
pub use models::{EnvironmentRecord, IngestOptions, SourceRecord, DEFAULT_ROOT_ENTITY_TYPE};
pub use search::{
    merge_by_score, score_of, Anchor, NodeKind, SearchModality, SearchOptions, SearchPayload,
    TemporalFilter, DEFAULT_ANCHOR_MAX_HOPS, DEFAULT_TOP_K,
};

/// Result type alias for praxos operations
pub type Result<T> = std::result::Result<T, PraxosError>;
