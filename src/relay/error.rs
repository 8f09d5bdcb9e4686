//! Relay error taxonomy.

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Everything that can stop a relay from producing an upstream response.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The inbound request is unusable; no outbound call was made.
    #[error("{0}")]
    Validation(String),

    /// The upstream answered with a non-2xx status.
    #[error("Upstream responded with status {status}")]
    UpstreamStatus {
        status: StatusCode,
        body: Option<Value>,
    },

    /// No response arrived: DNS failure, refused connection, timeout.
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),

    /// The outbound request could not be constructed.
    #[error("Failed to build upstream request: {0}")]
    Setup(String),

    /// A fixed route expected JSON and got something else.
    #[error("Upstream returned a non-JSON response")]
    InvalidBody,
}

impl RelayError {
    /// Short label used for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::Validation(_) => "invalid_request",
            RelayError::UpstreamStatus { .. } => "upstream_error",
            RelayError::Unreachable(_) => "unreachable",
            RelayError::Setup(_) => "setup_error",
            RelayError::InvalidBody => "invalid_body",
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            RelayError::Setup(e.to_string())
        } else if e.is_timeout() {
            RelayError::Unreachable(format!("request timed out: {}", e))
        } else {
            RelayError::Unreachable(e.to_string())
        }
    }
}
