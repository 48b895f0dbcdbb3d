//! WhisperChain domain API
//!
//! Named operations over the REST client: feeds, single whispers, likes,
//! chain responses, themes, search and user sync. Identity is always an
//! explicit `viewer` argument.
//!
//! # Quick Start
//!
//! ```no_run
//! use whisperchain::api::{FeedOptions, FeedSort, WhisperApi};
//! use whisperchain::auth::Viewer;
//! use whisperchain::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let api = WhisperApi::from_config(&config)?;
//!
//!     let viewer = Viewer::new("user_2abc");
//!     let feed = api
//!         .get_whispers(Some(&viewer), FeedOptions::new(FeedSort::Trending))
//!         .await?;
//!     println!("{} whispers", feed.len());
//!     Ok(())
//! }
//! ```

pub mod chains;
pub mod error;
pub mod likes;
pub mod search;
pub mod themes;
pub mod users;
pub mod whispers;

use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::auth::Viewer;
use crate::config::AppConfig;
use crate::models::MAX_TEXT_CHARS;
use crate::rest::{RestClient, TransportError};
use crate::transform::{TemplateTransformer, Transformer};

pub use error::{ApiError, Result};
pub use likes::LikeToggle;
pub use search::{SEARCH_RESULT_LIMIT, SEARCH_SCAN_LIMIT};
pub use whispers::{FeedOptions, FeedSort};

pub(crate) const WHISPERS: &str = "whispers";
pub(crate) const CHAIN_RESPONSES: &str = "chain_responses";
pub(crate) const LIKES: &str = "likes";
pub(crate) const THEMES: &str = "themes";
pub(crate) const USERS: &str = "users";
pub(crate) const FOLLOWS: &str = "follows";

/// Entry point for all domain operations
#[derive(Clone)]
pub struct WhisperApi {
    rest: RestClient,
    transformer: Arc<dyn Transformer>,
}

impl WhisperApi {
    pub fn new(rest: RestClient, transformer: Arc<dyn Transformer>) -> Self {
        Self { rest, transformer }
    }

    /// API using the random template transform
    pub fn with_templates(rest: RestClient) -> Self {
        Self::new(rest, Arc::new(TemplateTransformer::new()))
    }

    pub fn from_config(config: &AppConfig) -> std::result::Result<Self, TransportError> {
        Ok(Self::with_templates(RestClient::from_config(config)?))
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub(crate) fn transform(&self, text: &str) -> String {
        self.transformer.transform(text)
    }
}

pub(crate) fn require_viewer<'a>(viewer: Option<&'a Viewer>, action: &'static str) -> Result<&'a Viewer> {
    viewer.ok_or(ApiError::NotAuthenticated(action))
}

/// Trimmed text, or a validation error if it is blank or too long
pub(crate) fn validate_text(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::Validation("text must not be empty".to_string()));
    }
    let chars = text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(ApiError::Validation(format!(
            "text is {} characters, the limit is {}",
            chars, MAX_TEXT_CHARS
        )));
    }
    Ok(text)
}

/// Counter columns of a whisper
#[derive(Debug, Deserialize)]
pub(crate) struct WhisperCounters {
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub chain_count: i64,
}

impl WhisperApi {
    pub(crate) async fn read_counters(&self, whisper_id: &str) -> Result<WhisperCounters> {
        let query = self
            .rest
            .from(WHISPERS)
            .select("id,likes_count,chain_count")
            .eq("id", whisper_id)
            .maybe_single();

        self.rest
            .execute(&query)
            .await
            .row::<WhisperCounters>()?
            .ok_or_else(|| ApiError::NotFound(format!("whisper {}", whisper_id)))
    }

    /// Overwrite one counter column with a client-computed value
    pub(crate) async fn write_counter(&self, whisper_id: &str, column: &str, value: i64) -> Result<()> {
        let mut body = Map::new();
        body.insert(column.to_string(), Value::from(value));
        let query = self
            .rest
            .from(WHISPERS)
            .update(Value::Object(body))
            .eq("id", whisper_id);

        self.rest.execute(&query).await.into_result()?;
        Ok(())
    }
}
