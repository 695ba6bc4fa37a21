//! Configuration for the praxos client

use crate::PraxosError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "https://api.praxos.ai/";

/// Per-request timeout used when none is configured
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

/// Version reported in the User-Agent header
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Example config file as TOML
pub const EXAMPLE_CONFIG: &str = r#"# Praxos client configuration

# API key (required unless passed with --api-key or PRAXOS_API_KEY)
api_key = "your-api-key"
# API base URL
base_url = "https://api.praxos.ai/"
# Per-request timeout in seconds
timeout = 10.0

# Extra query parameters sent with every request
[params]
"#;

/// Immutable connection settings owned by a `Client`.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    base_url: String,
    timeout: Duration,
    params: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Create a config with default base URL and timeout.
    ///
    /// Fails if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> crate::Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PraxosError::Config("API key is required".to_string()));
        }
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            params: BTreeMap::new(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> crate::Result<Self> {
        let base_url = base_url.into();
        let trimmed = base_url.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(PraxosError::Config(format!(
                "base URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }

    /// Set the per-request timeout in seconds. Must be finite and positive.
    pub fn with_timeout_secs(mut self, secs: f64) -> crate::Result<Self> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(PraxosError::Config(format!(
                "timeout must be a positive number of seconds, got {}",
                secs
            )));
        }
        self.timeout = Duration::from_secs_f64(secs);
        Ok(self)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Query parameters attached to every request
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Headers sent on every request, derived from the API key
    pub fn headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        );
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert(
            "User-Agent".to_string(),
            format!("praxos-rust/{}", SDK_VERSION),
        );
        headers
    }

    /// Join `path` onto the base URL, dropping any leading `/` on the path
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Load config from a TOML file. The file must provide `api_key`.
    pub fn load(path: &Path) -> crate::Result<Self> {
        ConfigFile::load(path)?.into_config()
    }

    /// Parse config from TOML string. The document must provide `api_key`.
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        ConfigFile::from_toml(content)?.into_config()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("params", &self.params)
            .finish()
    }
}

/// On-disk form of the config, where every field is optional so callers can
/// layer command-line overrides on top before building a `ClientConfig`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| PraxosError::ConfigParse(e.to_string()))
    }

    pub fn into_config(self) -> crate::Result<ClientConfig> {
        let mut config = ClientConfig::new(self.api_key.unwrap_or_default())?;
        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url)?;
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout_secs(timeout)?;
        }
        Ok(config.with_params(self.params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("key-123").unwrap();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.params().is_empty());
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(matches!(
            ClientConfig::new(""),
            Err(PraxosError::Config(_))
        ));
        assert!(ClientConfig::new("   ").is_err());
    }

    #[test]
    fn test_timeout_validation() {
        let config = ClientConfig::new("k").unwrap();
        assert!(config.clone().with_timeout_secs(0.0).is_err());
        assert!(config.clone().with_timeout_secs(-1.0).is_err());
        assert!(config.clone().with_timeout_secs(f64::NAN).is_err());
        let config = config.with_timeout_secs(2.5).unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_base_url_validation() {
        let config = ClientConfig::new("k").unwrap();
        assert!(config.clone().with_base_url("ftp://x").is_err());
        let config = config.with_base_url("http://localhost:8000").unwrap();
        assert_eq!(config.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_headers_derived_from_key() {
        let config = ClientConfig::new("secret").unwrap();
        let headers = config.headers();
        assert_eq!(headers["Authorization"], "Bearer secret");
        assert_eq!(headers["Accept"], "application/json");
        assert!(headers["User-Agent"].starts_with("praxos-rust/"));
    }

    #[test]
    fn test_url_for_strips_leading_slash() {
        let config = ClientConfig::new("k")
            .unwrap()
            .with_base_url("https://api.example.com/")
            .unwrap();
        assert_eq!(config.url_for("/search"), "https://api.example.com/search");
        assert_eq!(config.url_for("search"), "https://api.example.com/search");

        let config = config.with_base_url("https://api.example.com").unwrap();
        assert_eq!(
            config.url_for("sources/s1/status"),
            "https://api.example.com/sources/s1/status"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ClientConfig::new("top-secret").unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("top-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_from_toml() {
        let config = ClientConfig::from_toml(
            r#"
api_key = "abc"
base_url = "http://localhost:9000"
timeout = 3.0

[params]
region = "eu"
"#,
        )
        .unwrap();
        assert_eq!(config.api_key(), "abc");
        assert_eq!(config.base_url(), "http://localhost:9000");
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.params()["region"], "eu");
    }

    #[test]
    fn test_example_config_parses_without_key_requirement() {
        let file = ConfigFile::from_toml(EXAMPLE_CONFIG).unwrap();
        assert_eq!(file.timeout, Some(10.0));
        assert!(file.params.is_empty());
    }

    #[test]
    fn test_toml_missing_key_fails() {
        assert!(matches!(
            ClientConfig::from_toml("timeout = 5.0"),
            Err(PraxosError::Config(_))
        ));
        assert!(matches!(
            ClientConfig::from_toml("timeout = [ "),
            Err(PraxosError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("praxos.toml");
        std::fs::write(&path, "api_key = \"file-key\"\n").unwrap();
        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.api_key(), "file-key");
    }
}
