//! WhisperChain client library
//!
//! A PostgREST query client and the WhisperChain domain operations built on
//! it: whisper feeds, likes, chain responses, themes, search and user sync.

// REST layer
pub mod rest;

// Domain API
pub mod api;
pub mod batch;
pub mod models;
pub mod transform;

// Session, configuration and logging
pub mod auth;
pub mod config;
pub mod telemetry;

pub use api::{ApiError, FeedOptions, FeedSort, WhisperApi};
pub use auth::Viewer;
pub use config::AppConfig;
pub use rest::{Query, RestClient, RestError, RestResponse};
