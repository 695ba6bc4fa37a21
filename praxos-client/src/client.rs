//! Blocking HTTP client for the Praxos API

use crate::environment::Environment;
use crate::response::{decode_body, map_status_error, parse_list, parse_record, transport_error};
use praxos_core::{ClientConfig, EnvironmentRecord, PraxosError, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Path probed once at construction to check the API key
const VALIDATION_PATH: &str = "api-token-validation";

/// Request body encoding
#[derive(Debug)]
pub(crate) enum RequestBody {
    Empty,
    Json(Value),
    /// Form fields plus file parts, sent as multipart/form-data
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    },
}

#[derive(Debug)]
pub(crate) struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Praxos API client.
///
/// Owns one HTTP session shared by every request issued through it and by
/// the `Environment`/`Source` handles borrowed from it. Dropping the client
/// releases the session. The client is `Send + Sync`; each call is one
/// blocking request with no retries.
pub struct Client {
    config: ClientConfig,
    http: reqwest::blocking::Client,
}

impl Client {
    /// Connect with default base URL and timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(ClientConfig::new(api_key)?)
    }

    /// Open a session and validate the API key with one request.
    ///
    /// No client is returned if the server rejects the key.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .default_headers(default_headers(&config)?)
            .timeout(config.timeout())
            .build()
            .map_err(|e| PraxosError::Config(format!("failed to build HTTP client: {}", e)))?;

        let client = Self { config, http };
        client.validate_api_key()?;
        info!(base_url = %client.config.base_url(), "connected to praxos");
        Ok(client)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Check the API key against the server
    pub fn validate_api_key(&self) -> Result<()> {
        self.request(Method::GET, VALIDATION_PATH, &[], RequestBody::Empty)?;
        Ok(())
    }

    /// Send one request and decode the response.
    ///
    /// `query` is appended after the configured default params. Non-2xx
    /// statuses are mapped to errors; transport failures carry status 0.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: RequestBody,
    ) -> Result<Value> {
        let url = self.config.url_for(path);
        debug!(%method, path, "praxos request");

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .query(&merge_query(self.config.params(), query));
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { fields, files } => builder.multipart(build_form(fields, files)?),
        };

        let response = builder.send().map_err(|e| {
            warn!(%method, path, error = %e, "praxos request failed to send");
            transport_error(&e)
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response.text().map_err(|e| transport_error(&e))?;

        if !(200..300).contains(&status) {
            warn!(%method, path, status, "praxos request rejected");
            return Err(map_status_error(status, &text));
        }

        Ok(decode_body(content_type.as_deref(), &text))
    }

    /// Create an environment. `name` must be non-empty.
    pub fn create_environment(&self, name: &str) -> Result<Environment<'_>> {
        if name.is_empty() {
            return Err(PraxosError::validation("Environment name is required"));
        }
        let response = self.request(
            Method::POST,
            "environment",
            &[],
            RequestBody::Json(json!({ "name": name })),
        )?;
        let record: EnvironmentRecord = parse_record(response, "environment")?;
        Ok(Environment::new(self, record))
    }

    /// List every environment on the account
    pub fn get_environments(&self) -> Result<Vec<Environment<'_>>> {
        let response = self.request(Method::GET, "environment", &[], RequestBody::Empty)?;
        let records: Vec<EnvironmentRecord> = parse_list(response, "environments")?;
        Ok(records
            .into_iter()
            .map(|record| Environment::new(self, record))
            .collect())
    }

    /// Find an environment whose id or name equals `id_or_name`.
    ///
    /// Ids are matched before names.
    pub fn get_environment(&self, id_or_name: &str) -> Result<Environment<'_>> {
        let mut environments = self.get_environments()?;
        let position = environments
            .iter()
            .position(|env| env.id() == id_or_name)
            .or_else(|| environments.iter().position(|env| env.name() == id_or_name));
        match position {
            Some(pos) => Ok(environments.swap_remove(pos)),
            None => Err(PraxosError::validation(format!(
                "no environment with id or name '{}'",
                id_or_name
            ))),
        }
    }

    /// Release the HTTP session.
    pub fn close(self) {
        info!(base_url = %self.config.base_url(), "closing praxos client");
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").field("config", &self.config).finish()
    }
}

/// Default params overlaid with call-level pairs; call-level values win.
fn merge_query<'a>(
    defaults: &'a BTreeMap<String, String>,
    query: &[(&'a str, &'a str)],
) -> BTreeMap<&'a str, &'a str> {
    let mut merged: BTreeMap<&str, &str> = defaults
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    merged.extend(query.iter().copied());
    merged
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in config.headers() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| PraxosError::Config(format!("invalid header name '{}': {}", name, e)))?;
        let mut value = HeaderValue::from_str(&value)
            .map_err(|_| PraxosError::Config(format!("invalid value for header '{}'", name)))?;
        if name == AUTHORIZATION {
            value.set_sensitive(true);
        }
        headers.insert(name, value);
    }
    Ok(headers)
}

fn build_form(fields: Vec<(String, String)>, files: Vec<FilePart>) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name, value);
    }
    for file in files {
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(file.content_type)
            .map_err(|e| PraxosError::validation(format!("invalid content type: {}", e)))?;
        form = form.part(file.field, part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers_mark_key_sensitive() {
        let config = ClientConfig::new("k-1").unwrap();
        let headers = default_headers(&config).unwrap();
        let auth = headers.get(AUTHORIZATION).unwrap();
        assert!(auth.is_sensitive());
        assert_eq!(auth.to_str().unwrap(), "Bearer k-1");
    }

    #[test]
    fn test_call_level_query_overrides_default_param() {
        let mut defaults = BTreeMap::new();
        defaults.insert("environment_id".to_string(), "default-env".to_string());
        defaults.insert("region".to_string(), "eu".to_string());

        let merged = merge_query(&defaults, &[("environment_id", "env-1")]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["environment_id"], "env-1");
        assert_eq!(merged["region"], "eu");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig::new("secret-key").unwrap();
        let client = Client {
            config,
            http: reqwest::blocking::Client::new(),
        };
        let rendered = format!("{:?}", client);
        assert!(rendered.starts_with("Client"));
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn test_header_rejects_control_characters() {
        let config = ClientConfig::new("bad\nkey").unwrap();
        assert!(matches!(
            default_headers(&config),
            Err(PraxosError::Config(_))
        ));
    }
}
