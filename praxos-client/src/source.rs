//! Source resource handle

use crate::client::{Client, RequestBody};
use praxos_core::{Result, SourceRecord};
use reqwest::Method;
use serde_json::Value;
use std::fmt;

/// An ingested document or object, borrowed from the `Client` that
/// fetched it.
pub struct Source<'c> {
    client: &'c Client,
    record: SourceRecord,
}

impl<'c> Source<'c> {
    pub(crate) fn new(client: &'c Client, record: SourceRecord) -> Self {
        Self { client, record }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn environment_id(&self) -> &str {
        &self.record.environment_id
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

    pub fn record(&self) -> &SourceRecord {
        &self.record
    }

    pub fn into_record(self) -> SourceRecord {
        self.record
    }

    /// Processing status as reported by the server
    pub fn get_status(&self) -> Result<Value> {
        self.client.request(
            Method::GET,
            &format!("/sources/{}/status", self.record.id),
            &[],
            RequestBody::Empty,
        )
    }
}

impl fmt::Display for Source<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Source id='{}' name='{}'>", self.record.id, self.record.name)
    }
}

impl fmt::Debug for Source<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source").field("record", &self.record).finish()
    }
}
