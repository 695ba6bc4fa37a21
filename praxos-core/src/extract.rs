//! Extraction request parameters

use crate::search::non_empty;
use crate::PraxosError;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Which schema to extract entities for: a label, or a Rust type whose
/// unqualified name is used as the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    ByName(String),
    ByType(&'static str),
}

impl Schema {
    pub fn of<T: ?Sized>() -> Self {
        Schema::ByType(std::any::type_name::<T>())
    }

    pub fn label(&self) -> &str {
        match self {
            Schema::ByName(name) => name,
            Schema::ByType(type_name) => {
                let base = type_name.split('<').next().unwrap_or(type_name);
                base.rsplit("::").next().unwrap_or(base)
            }
        }
    }
}

impl From<&str> for Schema {
    fn from(name: &str) -> Self {
        Schema::ByName(name.to_string())
    }
}

impl From<String> for Schema {
    fn from(name: String) -> Self {
        Schema::ByName(name)
    }
}

/// Output shape of a literal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiteralMode {
    /// Only the literal values
    #[default]
    LiteralsOnly,
    /// Entities together with their literals
    FullEntities,
}

impl LiteralMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiteralMode::LiteralsOnly => "literals_only",
            LiteralMode::FullEntities => "full_entities",
        }
    }
}

impl fmt::Display for LiteralMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LiteralMode {
    type Err = PraxosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "literals_only" => Ok(LiteralMode::LiteralsOnly),
            "full_entities" => Ok(LiteralMode::FullEntities),
            _ => Err(PraxosError::validation(
                "mode must be 'literals_only' or 'full_entities'",
            )),
        }
    }
}

/// Narrows an extraction to one source and/or page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractScope {
    pub source_id: Option<String>,
    pub page_idx: Option<String>,
}

impl ExtractScope {
    pub fn source(source_id: impl Into<String>) -> Self {
        Self {
            source_id: Some(source_id.into()),
            page_idx: None,
        }
    }

    pub fn with_page(mut self, page_idx: impl Into<String>) -> Self {
        self.page_idx = Some(page_idx.into());
        self
    }

    /// Insert the non-empty scope fields into `payload`
    pub fn write_into(&self, payload: &mut Map<String, Value>) {
        if let Some(source_id) = non_empty(self.source_id.as_deref()) {
            payload.insert("source_id".to_string(), Value::String(source_id));
        }
        if let Some(page_idx) = non_empty(self.page_idx.as_deref()) {
            payload.insert("page_idx".to_string(), Value::String(page_idx));
        }
    }
}
