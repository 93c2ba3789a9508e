//! Gateway errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The service could not be reached at all.
    #[error("Could not connect to {0}")]
    Unreachable(String),

    #[error("Request to {endpoint} timed out after {seconds}s")]
    Timeout { endpoint: String, seconds: u64 },

    /// The service answered but refused the request.
    #[error("{endpoint} rejected the request ({status}): {message}")]
    Rejected {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl GatewayError {
    /// Whether the failure means the remote side was never reached.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout { .. })
    }

    pub(crate) fn from_reqwest(endpoint: &str, timeout_secs: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                endpoint: endpoint.to_string(),
                seconds: timeout_secs,
            }
        } else if err.is_connect() {
            Self::Unreachable(endpoint.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}
