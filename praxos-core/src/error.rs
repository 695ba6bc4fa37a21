//! Error types for praxos operations

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PraxosError {
    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid argument: {0}")]
    Validation(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The server rejected the API key (401 or 403).
    #[error("Invalid API key [{status}]: {message}")]
    InvalidApiKey { status: u16, message: String },

    /// Any other non-2xx response. Status 0 is used when no response
    /// was involved, e.g. a failed file upload.
    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },

    /// No response was received (DNS, connection refused, timeout).
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PraxosError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP status carried by remote-call failures. Transport failures
    /// report 0.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::InvalidApiKey { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Transport { .. } => Some(0),
            _ => None,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::InvalidApiKey { .. })
    }

    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Errors raised locally before any request was sent.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::FileNotFound(_) | Self::Config(_)
        )
    }

    /// Short machine-readable code, used for JSON error output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::ConfigParse(_) => "config_error",
            Self::Validation(_) => "validation_error",
            Self::FileNotFound(_) => "file_not_found",
            Self::InvalidApiKey { .. } => "invalid_api_key",
            Self::Api { .. } => "api_error",
            Self::Transport { .. } => "transport_error",
            Self::InvalidResponse(_) => "invalid_response",
            Self::Io(_) => "io_error",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let err = PraxosError::Transport {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.status_code(), Some(0));
        assert!(err.is_transport_error());

        let err = PraxosError::InvalidApiKey {
            status: 401,
            message: "bad key".to_string(),
        };
        assert_eq!(err.status_code(), Some(401));
        assert!(err.is_auth_error());

        assert_eq!(PraxosError::validation("empty").status_code(), None);
    }

    #[test]
    fn test_validation_classification() {
        assert!(PraxosError::validation("x").is_validation_error());
        assert!(PraxosError::FileNotFound(PathBuf::from("a.pdf")).is_validation_error());
        let api = PraxosError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!api.is_validation_error());
        assert_eq!(api.to_string(), "API error [500]: boom");
    }
}
