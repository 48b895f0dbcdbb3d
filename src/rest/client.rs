use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::rest::{
    error::TransportError,
    query::{Method, Operation, Query},
    response::RestResponse,
    transport::{HttpRequest, ReqwestTransport, Transport},
};

/// Client for a PostgREST endpoint (`{base_url}/rest/v1`)
///
/// Cheap to clone; clones share the underlying transport.
#[derive(Clone)]
pub struct RestClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    api_key: String,
    bearer: String,
}

impl RestClient {
    /// Create a client that authenticates with the anon key
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let api_key = api_key.into();
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer: api_key.clone(),
            api_key,
        }
    }

    /// Create a network-backed client from application configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(Duration::from_secs(config.connect_timeout_secs))?;
        Ok(Self::new(
            config.database_url.clone(),
            config.database_anon_key.clone(),
            Arc::new(transport),
        ))
    }

    /// A clone that sends `token` as the bearer instead of the anon key
    pub fn with_bearer(&self, token: impl Into<String>) -> Self {
        Self {
            bearer: token.into(),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a query against `table`
    pub fn from(&self, table: &str) -> Query {
        Query::from_table(table)
    }

    /// URL a query is sent to, including its query string
    pub fn url_for(&self, query: &Query) -> String {
        format!(
            "{}/rest/v1/{}?{}",
            self.base_url,
            query.table,
            query.to_query_string()
        )
    }

    fn headers(&self, extra_prefer: Option<&str>) -> Vec<(String, String)> {
        let prefer = match extra_prefer {
            Some(extra) => format!("return=representation,{}", extra),
            None => "return=representation".to_string(),
        };
        vec![
            ("apikey".to_string(), self.api_key.clone()),
            ("Authorization".to_string(), format!("Bearer {}", self.bearer)),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Prefer".to_string(), prefer),
        ]
    }

    /// Build the HTTP request a query would send
    pub fn build_request(&self, query: &Query) -> HttpRequest {
        let extra_prefer = match query.operation {
            Operation::Upsert { .. } => Some("resolution=merge-duplicates"),
            _ => None,
        };
        HttpRequest {
            method: query.method(),
            url: self.url_for(query),
            headers: self.headers(extra_prefer),
            body: query.body().cloned(),
        }
    }

    /// Execute a query
    ///
    /// Never fails out of band: network failures, non-2xx responses and
    /// undecodable bodies all end up in [`RestResponse::error`].
    pub async fn execute(&self, query: &Query) -> RestResponse {
        let request = self.build_request(query);
        debug!(method = request.method.as_str(), table = %query.table, "rest request");

        let result = self.transport.send(request).await;
        let response = RestResponse::from_transport(query, result);

        match &response.error {
            Some(err) => warn!(
                method = query.method().as_str(),
                table = %query.table,
                status = err.status,
                error = %err.message,
                "rest request failed"
            ),
            None => debug!(table = %query.table, status = response.status, "rest response"),
        }

        response
    }

    /// Call a database function: POST `{base_url}/rest/v1/rpc/{function}`
    pub async fn rpc(&self, function: &str, args: Value) -> RestResponse {
        let request = HttpRequest {
            method: Method::Post,
            url: format!("{}/rest/v1/rpc/{}", self.base_url, function),
            headers: self.headers(None),
            body: Some(args),
        };
        debug!(function, "rpc request");

        let response = match self.transport.send(request).await {
            Ok(http) => RestResponse::from_http(http),
            Err(err) => RestResponse::failed(crate::rest::RestError::network(&err)),
        };

        if let Some(err) = &response.error {
            warn!(function, status = err.status, error = %err.message, "rpc failed");
        }
        response
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
