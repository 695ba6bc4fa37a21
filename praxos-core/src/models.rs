//! Resource records returned by the API

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Root entity type used for business data when none is given
pub const DEFAULT_ROOT_ENTITY_TYPE: &str = "schema:Thing";

/// A named workspace holding sources and a searchable graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentRecord {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

/// An ingested unit of data inside an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    pub environment_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Optional naming and processing hints for JSON-bodied ingestion.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Extra metadata passed to the processing pipeline
    pub metadata: Option<Map<String, Value>>,
    /// Pipeline switches, e.g. `{"generate_sentences": true}`
    pub processing_config: Option<Map<String, Value>>,
}

impl IngestOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_processing_config(mut self, config: Map<String, Value>) -> Self {
        self.processing_config = Some(config);
        self
    }

    /// Write `name`, `description`, `metadata` and `processing_config` into
    /// `payload`. Unset name/description go out as null, unset maps as `{}`.
    pub fn write_into(&self, payload: &mut Map<String, Value>) {
        payload.insert("name".to_string(), opt_string(&self.name));
        payload.insert("description".to_string(), opt_string(&self.description));
        payload.insert(
            "metadata".to_string(),
            Value::Object(self.metadata.clone().unwrap_or_default()),
        );
        payload.insert(
            "processing_config".to_string(),
            Value::Object(self.processing_config.clone().unwrap_or_default()),
        );
    }
}

fn opt_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_environment_description_defaults() {
        let env: EnvironmentRecord = serde_json::from_value(json!({
            "id": "env-1",
            "name": "research",
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(env.description, "");
        assert_eq!(env.name, "research");
    }

    #[test]
    fn test_source_exposes_only_known_fields() {
        let source: SourceRecord = serde_json::from_value(json!({
            "id": "src-1",
            "environment_id": "env-1",
            "name": null,
            "created_at": "2024-01-01",
            "description": "notes",
            "status": "processing"
        }))
        .unwrap();
        assert_eq!(source.name, "");
        let round = serde_json::to_value(&source).unwrap();
        assert_eq!(
            round,
            json!({
                "id": "src-1",
                "environment_id": "env-1",
                "name": "",
                "created_at": "2024-01-01",
                "description": "notes"
            })
        );
    }

    #[test]
    fn test_source_requires_environment_id() {
        let result: Result<SourceRecord, _> =
            serde_json::from_value(json!({"id": "src-1", "name": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_ingest_options_payload_shape() {
        let mut payload = Map::new();
        IngestOptions::default().write_into(&mut payload);
        assert_eq!(
            Value::Object(payload),
            json!({
                "name": null,
                "description": null,
                "metadata": {},
                "processing_config": {}
            })
        );

        let mut config = Map::new();
        config.insert("generate_facts".to_string(), json!(false));
        let mut payload = Map::new();
        IngestOptions::named("crm")
            .with_processing_config(config)
            .write_into(&mut payload);
        assert_eq!(payload["name"], json!("crm"));
        assert_eq!(payload["processing_config"], json!({"generate_facts": false}));
    }
}
