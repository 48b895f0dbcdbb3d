use tracing::info;

use crate::api::{require_viewer, validate_text, ApiError, Result, WhisperApi, CHAIN_RESPONSES, USERS};
use crate::auth::Viewer;
use crate::batch::{distinct_ids, load_by_ids};
use crate::models::{ChainResponse, ChainResponseRow, NewChainResponse, User};

impl WhisperApi {
    /// Replies to a whisper, oldest first
    pub async fn get_chain_responses(&self, whisper_id: &str) -> Result<Vec<ChainResponse>> {
        let query = self
            .rest
            .from(CHAIN_RESPONSES)
            .eq("whisper_id", whisper_id)
            .order("created_at", true);

        let rows: Vec<ChainResponseRow> = self.rest.execute(&query).await.rows()?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids = distinct_ids(rows.iter().map(|r| r.user_id.as_str()));
        let users = load_by_ids::<User>(&self.rest, USERS, "id", &user_ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let author = users.get(&row.user_id);
                ChainResponse::from_row(row, author)
            })
            .collect())
    }

    /// Reply to a whisper and bump its `chain_count`
    pub async fn create_chain_response(
        &self,
        viewer: Option<&Viewer>,
        whisper_id: &str,
        text: &str,
    ) -> Result<ChainResponse> {
        let viewer = require_viewer(viewer, "reply to a whisper")?;
        let text = validate_text(text)?;
        let counters = self.read_counters(whisper_id).await?;

        let new_response = NewChainResponse {
            whisper_id: whisper_id.to_string(),
            user_id: viewer.user_id.clone(),
            original_text: text.to_string(),
            transformed_text: self.transform(text),
        };
        let body = serde_json::to_value(&new_response)
            .map_err(|e| ApiError::Validation(format!("unserializable chain response: {}", e)))?;

        let query = self.rest.from(CHAIN_RESPONSES).insert(body);
        let row: ChainResponseRow = self
            .rest
            .execute(&query)
            .await
            .row()?
            .ok_or_else(|| ApiError::NotFound("inserted chain response was not returned".to_string()))?;

        self.write_counter(whisper_id, "chain_count", counters.chain_count + 1)
            .await?;

        let users = load_by_ids::<User>(&self.rest, USERS, "id", &[viewer.user_id.clone()]).await?;
        info!(whisper_id, response_id = %row.id, "chain response created");
        Ok(ChainResponse::from_row(row, users.get(&viewer.user_id)))
    }
}
