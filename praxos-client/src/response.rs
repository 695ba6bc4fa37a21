//! Response decoding and error mapping

use praxos_core::{PraxosError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Keys checked, in order, for a human-readable message in an error body
const MESSAGE_KEYS: [&str; 3] = ["detail", "message", "error"];

/// Turn a successful response body into a structured value.
///
/// A blank body decodes to `Value::Null`. A JSON content type yields the
/// parsed document; any other body is returned as a string.
pub fn decode_body(content_type: Option<&str>, text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    let is_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);
    if is_json {
        if let Ok(value) = serde_json::from_str(text) {
            return value;
        }
    }
    Value::String(text.to_string())
}

/// Map a non-2xx response to an error. 401 and 403 mean the API key was
/// rejected.
pub fn map_status_error(status: u16, body: &str) -> PraxosError {
    let message = error_message(status, body);
    match status {
        401 | 403 => PraxosError::InvalidApiKey { status, message },
        _ => PraxosError::Api { status, message },
    }
}

fn error_message(status: u16, body: &str) -> String {
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(body) {
        for key in MESSAGE_KEYS {
            match obj.get(key) {
                Some(Value::String(msg)) if !msg.is_empty() => return msg.clone(),
                Some(Value::Null) | None => continue,
                Some(Value::String(_)) => continue,
                Some(other) => return other.to_string(),
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status)
    } else {
        trimmed.to_string()
    }
}

/// Describe a failure where no response was received
pub fn transport_error(err: &reqwest::Error) -> PraxosError {
    let mut message = format!("Request failed: {}", err);
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    if err.is_timeout() {
        message.push_str(" (timed out)");
    }
    PraxosError::Transport { message }
}

/// Deserialize one resource from a response
pub(crate) fn parse_record<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| PraxosError::InvalidResponse(format!("malformed {}: {}", what, e)))
}

/// Deserialize a bare-array listing. An empty body counts as no entries.
pub(crate) fn parse_list<T: DeserializeOwned>(value: Value, what: &str) -> Result<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| parse_record(item, what))
            .collect(),
        other => Err(PraxosError::InvalidResponse(format!(
            "expected a list of {}, got {}",
            what,
            kind_of(&other)
        ))),
    }
}

/// Take the named array field from a response envelope, or nothing.
pub(crate) fn take_array(value: Value, field: &str) -> Vec<Value> {
    match value {
        Value::Object(mut obj) => match obj.remove(field) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
