//! Praxos Client - Blocking client for the Praxos knowledge-graph API
//!
//! A `Client` owns one HTTP session and validates its API key when it is
//! built. `Environment` and `Source` handles borrow the client, so the
//! compiler keeps the session alive for as long as any handle can issue
//! requests through it.

pub mod client;
pub mod environment;
pub mod response;
pub mod source;

pub use client::Client;
pub use environment::{Environment, DEFAULT_ANCHOR_QUERY, SUPPORTED_FILE_TYPES};
pub use source::Source;

pub use praxos_core::{
    Anchor, ClientConfig, Context, ContextResult, ConversationEntry, EnvironmentRecord,
    ExtractScope, Graph, GraphKind, IngestOptions, LiteralMode, Message, NodeKind, PraxosError,
    Result, Schema, SearchModality, SearchOptions, SourceRecord, TemporalFilter,
};
