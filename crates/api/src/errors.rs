//! Error types for Formation API calls.

use thiserror::Error;

/// Everything that can go wrong while talking to the Formation platform.
#[derive(Debug, Error)]
pub enum FormationError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Authentication failed with status {status}: {body}")]
    Authentication { status: u16, body: String },

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Metadata key or value cannot be sent as a header: {key}")]
    InvalidMetadata { key: String },

    #[error("Data store path must not contain '.' or '..' segments: {path}")]
    InvalidPath { path: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FormationError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a metadata header error for the given key.
    pub fn invalid_metadata(key: impl Into<String>) -> Self {
        Self::InvalidMetadata { key: key.into() }
    }

    /// HTTP status carried by the error, when the platform answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Transport(error) => error.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Whether repeating the same call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status >= 500,
            Self::Transport(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FormationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable_client_errors_are_not() {
        let server = FormationError::Api {
            status: 503,
            body: "unavailable".into(),
        };
        let client = FormationError::Api {
            status: 404,
            body: "missing".into(),
        };
        let auth = FormationError::Authentication {
            status: 401,
            body: "bad credentials".into(),
        };

        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(!auth.is_retryable());
        assert_eq!(client.status(), Some(404));
        assert_eq!(FormationError::configuration("x").status(), None);
    }

    #[test]
    fn api_error_message_names_status_and_body() {
        let error = FormationError::Api {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(error.to_string(), "API error (status 500): boom");
    }
}
