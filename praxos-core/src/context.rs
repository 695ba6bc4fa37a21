//! LLM context hits returned by edge search

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One context hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Missing or null scores read as 0
    #[serde(default, deserialize_with = "null_as_zero")]
    pub score: f64,
    pub data: Value,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sentence: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

/// `get_context` yields the single best hit when one was asked for,
/// otherwise the full list.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextResult {
    Single(Context),
    Many(Vec<Context>),
}

impl ContextResult {
    pub fn into_vec(self) -> Vec<Context> {
        match self {
            ContextResult::Single(context) => vec![context],
            ContextResult::Many(contexts) => contexts,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ContextResult::Single(_) => 1,
            ContextResult::Many(contexts) => contexts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
