//! PostgREST client
//!
//! Queries are plain values ([`Query`]) built with chained calls and run by
//! [`RestClient::execute`], which always resolves to a [`RestResponse`]
//! holding either data or an error.
//!
//! ```no_run
//! use whisperchain::rest::{Query, RestClient, ReqwestTransport};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = ReqwestTransport::new(Duration::from_secs(5))?;
//!     let client = RestClient::new("https://project.supabase.co", "anon-key", Arc::new(transport));
//!
//!     let query = Query::from_table("themes").order("name", true);
//!     let response = client.execute(&query).await;
//!     if let Some(err) = response.error {
//!         eprintln!("failed with status {}: {}", err.status, err.message);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod query;
pub mod response;
pub mod transport;

pub use client::RestClient;
pub use error::{RestError, TransportError};
pub use query::{Cardinality, Filter, FilterOp, Method, Operation, Order, Query};
pub use response::RestResponse;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
