//! The `{data, error}` result of executing a query

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{RestError, TransportError};
use super::query::{Cardinality, Query};
use super::transport::HttpResponse;

/// Outcome of one REST call
///
/// Exactly one of the following holds: `error` is set, or `data` holds the
/// decoded body (which may be `None` for an empty body or a zero-row
/// `single()`).
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub data: Option<Value>,
    pub error: Option<RestError>,
    pub status: u16,
}

impl RestResponse {
    pub fn ok(data: Option<Value>, status: u16) -> Self {
        Self {
            data,
            error: None,
            status,
        }
    }

    pub fn failed(error: RestError) -> Self {
        Self {
            data: None,
            status: error.status,
            error: Some(error),
        }
    }

    /// Normalize a raw transport result according to the query's shape
    pub fn from_transport(query: &Query, result: Result<HttpResponse, TransportError>) -> Self {
        let response = match result {
            Ok(response) => response,
            Err(err) => return Self::failed(RestError::network(&err)),
        };

        let mut normalized = Self::from_http(response);
        if normalized.error.is_none() {
            let single = query.cardinality != Cardinality::Many || query.is_single_row_write();
            if single {
                normalized.data = normalized.data.and_then(unwrap_single);
            }
        }
        normalized
    }

    /// Parse a response without any cardinality normalization
    pub fn from_http(response: HttpResponse) -> Self {
        let status = response.status;
        if !(200..300).contains(&status) {
            return Self::failed(RestError::from_response(status, &response.body));
        }

        if response.body.trim().is_empty() {
            return Self::ok(None, status);
        }

        match serde_json::from_str::<Value>(&response.body) {
            Ok(value) => Self::ok(Some(value), status),
            Err(err) => Self::failed(RestError::decode(status, &err)),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into a plain `Result`
    pub fn into_result(self) -> Result<Option<Value>, RestError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.data),
        }
    }

    /// Decode the body as a list of rows; no body means no rows
    pub fn rows<T: DeserializeOwned>(self) -> Result<Vec<T>, RestError> {
        let status = self.status;
        match self.into_result()? {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).map_err(|e| RestError::decode(status, &e)))
                .collect(),
            Some(other) => serde_json::from_value(other)
                .map(|row| vec![row])
                .map_err(|e| RestError::decode(status, &e)),
        }
    }

    /// Decode the body as at most one row
    pub fn row<T: DeserializeOwned>(self) -> Result<Option<T>, RestError> {
        let status = self.status;
        match self.into_result()?.and_then(unwrap_single) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| RestError::decode(status, &e)),
        }
    }
}

// Arrays collapse to their first element; an empty array becomes no data.
fn unwrap_single(value: Value) -> Option<Value> {
    match value {
        Value::Array(items) => items.into_iter().next(),
        Value::Null => None,
        other => Some(other),
    }
}
