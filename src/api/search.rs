use crate::api::{Result, WhisperApi, WHISPERS};
use crate::auth::Viewer;
use crate::models::{Whisper, WhisperRow};

/// How many recent whispers a search looks through
pub const SEARCH_SCAN_LIMIT: usize = 100;

/// Most results a search returns
pub const SEARCH_RESULT_LIMIT: usize = 20;

impl WhisperApi {
    /// Case-insensitive substring search over recent whispers
    ///
    /// Only the [`SEARCH_SCAN_LIMIT`] newest published whispers are
    /// considered and at most [`SEARCH_RESULT_LIMIT`] are returned, newest
    /// first. A blank query returns nothing without a request.
    pub async fn search_whispers(&self, text: &str, viewer: Option<&Viewer>) -> Result<Vec<Whisper>> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let query = self
            .rest
            .from(WHISPERS)
            .eq("is_published", true)
            .order("created_at", false)
            .limit(SEARCH_SCAN_LIMIT);

        let rows: Vec<WhisperRow> = self.rest.execute(&query).await.rows()?;
        let matches: Vec<WhisperRow> = rows
            .into_iter()
            .filter(|row| matches_text(row, &needle))
            .take(SEARCH_RESULT_LIMIT)
            .collect();

        self.enrich(matches, viewer).await
    }
}

fn matches_text(row: &WhisperRow, needle: &str) -> bool {
    row.original_text.to_lowercase().contains(needle)
        || row.transformed_text.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::transport::testing::ScriptedTransport;
    use crate::rest::RestClient;
    use crate::transform::IdentityTransformer;
    use serde_json::json;
    use std::sync::Arc;

    fn rows(n: usize, text: &str) -> String {
        let items: Vec<_> = (0..n)
            .map(|i| {
                json!({
                    "id": format!("w{}", i),
                    "user_id": "u1",
                    "original_text": format!("{} {}", text, i),
                    "transformed_text": "stylized",
                    "created_at": "2024-05-01T12:00:00Z"
                })
            })
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    #[tokio::test]
    async fn test_blank_query_sends_nothing() {
        let transport = Arc::new(ScriptedTransport::default());
        let api = WhisperApi::new(RestClient::new("http://db", "key", transport.clone()), Arc::new(IdentityTransformer));

        assert!(api.search_whispers("   ", None).await.unwrap().is_empty());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_results_are_capped() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.reply(200, &rows(60, "Moonlight"));
        let api = WhisperApi::new(RestClient::new("http://db", "key", transport.clone()), Arc::new(IdentityTransformer));

        let results = api.search_whispers("MOON", None).await.unwrap();
        assert_eq!(results.len(), SEARCH_RESULT_LIMIT);
        assert_eq!(results[0].id, "w0");

        let url = &transport.sent()[0].url;
        assert!(url.contains("limit=100"));
        assert!(url.contains("order=created_at.desc"));
    }

    #[tokio::test]
    async fn test_matches_transformed_text() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.reply(200, &rows(3, "plain"));
        let api = WhisperApi::new(RestClient::new("http://db", "key", transport), Arc::new(IdentityTransformer));

        let results = api.search_whispers("Stylized", None).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_no_match() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.reply(200, &rows(3, "plain"));
        let api = WhisperApi::new(RestClient::new("http://db", "key", transport.clone()), Arc::new(IdentityTransformer));

        assert!(api.search_whispers("ocean", None).await.unwrap().is_empty());
        assert_eq!(transport.sent().len(), 1);
    }
}
