//! Errors raised while fetching a reading.

use thiserror::Error;

/// Message used when the API rejects a request without saying why.
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, TLS, connection reset, ...).
    #[error("Failed to reach the air quality API: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with something other than HTTP 200.
    #[error("Air quality API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The envelope or the payload reported `"error"`.
    #[error("{message}")]
    Api { message: String },

    /// The body was not the JSON shape the feed endpoint documents.
    #[error("Failed to parse air quality response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid API endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl FetchError {
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Upstream-provided message, when the API sent one.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            FetchError::Status { message, .. } | FetchError::Api { message } => {
                Some(message.as_str())
            }
            _ => None,
        }
    }

    /// Short user-facing hint for the CLI fallback view.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Transport(_) => {
                "Unable to reach api.waqi.info. Please check your internet connection.".to_string()
            }
            FetchError::Status { .. } | FetchError::Api { .. } => {
                "The air quality API rejected the request. Please check your API token and city."
                    .to_string()
            }
            FetchError::Decode(_) => {
                "The air quality API sent a response that could not be read.".to_string()
            }
            FetchError::InvalidEndpoint { .. } => {
                "The configured API endpoint is not a valid URL.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_bare_message() {
        let err = FetchError::api("Invalid key");
        assert_eq!(err.to_string(), "Invalid key");
        assert_eq!(err.upstream_message(), Some("Invalid key"));
    }

    #[test]
    fn status_error_mentions_code() {
        let err = FetchError::Status {
            status: 500,
            message: UNKNOWN_ERROR.to_string(),
        };
        assert_eq!(err.to_string(), "Air quality API returned HTTP 500: Unknown error");
        assert!(err.user_message().contains("API token"));
    }

    #[test]
    fn decode_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: FetchError = json_err.into();
        assert!(matches!(err, FetchError::Decode(_)));
        assert!(err.upstream_message().is_none());
    }
}
