//! Error types for upstream calls

use std::fmt;

use thiserror::Error;

/// Errors that can occur when talking to an upstream service
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Missing credential or unusable endpoint
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Connection, timeout or other network failure
    #[error("Request failed: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status
    #[error("API error (status {status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl UpstreamError {
    pub fn kind(&self) -> FailureKind {
        match self {
            UpstreamError::Config(_) => FailureKind::Config,
            UpstreamError::Transport(_) => FailureKind::Transport,
            UpstreamError::Status { .. } => FailureKind::UpstreamStatus,
            UpstreamError::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }
}

/// Failure category of an upstream call, used to classify degraded results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Config,
    Transport,
    UpstreamStatus,
    MalformedResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Config => "config",
            FailureKind::Transport => "transport",
            FailureKind::UpstreamStatus => "upstream_status",
            FailureKind::MalformedResponse => "malformed_response",
        };
        f.write_str(label)
    }
}
