//! Error types for the REST layer

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A request that never produced an HTTP response
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, TLS failure, reset, ...
    #[error("Network error: {0}")]
    Network(String),

    /// The request could not be built (bad URL, bad header value)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Uniform error carried in the `error` half of a [`RestResponse`](super::RestResponse)
///
/// `status` is the HTTP status code, or 0 when the transport failed before
/// any response arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message} (status {status})")]
pub struct RestError {
    pub message: String,
    pub status: u16,
    pub details: Option<Value>,
}

impl RestError {
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
            details: None,
        }
    }

    /// Build an error from a non-2xx response body
    ///
    /// The body is kept as parsed JSON when it parses, otherwise as the raw
    /// text. A `message` field in a JSON body becomes the error message.
    pub fn from_response(status: u16, body: &str) -> Self {
        let details = match serde_json::from_str::<Value>(body) {
            Ok(json) => Some(json),
            Err(_) if body.is_empty() => None,
            Err(_) => Some(Value::String(body.to_string())),
        };

        let message = details
            .as_ref()
            .and_then(|d| d.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {}", status));

        Self {
            message,
            status,
            details,
        }
    }

    /// Error for a failure below HTTP (status 0)
    pub fn network(err: &TransportError) -> Self {
        Self {
            message: err.to_string(),
            status: 0,
            details: None,
        }
    }

    /// Error for a response that arrived but could not be decoded
    pub fn decode(status: u16, err: &serde_json::Error) -> Self {
        Self {
            message: format!("Failed to decode response: {}", err),
            status,
            details: None,
        }
    }

    pub fn is_network(&self) -> bool {
        self.status == 0
    }
}
