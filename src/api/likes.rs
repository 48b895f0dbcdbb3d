use tracing::info;

use crate::api::{require_viewer, ApiError, Result, WhisperApi, LIKES};
use crate::auth::Viewer;
use crate::models::Like;

/// Result of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    /// Whether the viewer likes the whisper now
    pub liked: bool,
    /// Counter value written back to the whisper
    pub likes_count: i64,
}

impl WhisperApi {
    /// Like or unlike a whisper
    ///
    /// Reads the existing like row and deletes it if present, inserts one
    /// otherwise, then writes the whisper's `likes_count` adjusted by one.
    /// None of this is atomic: two concurrent toggles by the same viewer can
    /// leave the row and the counter out of step with each other.
    pub async fn toggle_like(&self, whisper_id: &str, viewer: Option<&Viewer>) -> Result<LikeToggle> {
        let viewer = require_viewer(viewer, "like a whisper")?;
        let counters = self.read_counters(whisper_id).await?;

        let liked = if self.is_liked(whisper_id, viewer).await? {
            let query = self
                .rest
                .from(LIKES)
                .delete()
                .eq("whisper_id", whisper_id)
                .eq("user_id", viewer.user_id.as_str());
            self.rest.execute(&query).await.into_result()?;
            false
        } else {
            let body = serde_json::to_value(Like::new(whisper_id, viewer.user_id.as_str()))
                .map_err(|e| ApiError::Validation(format!("unserializable like: {}", e)))?;
            let query = self.rest.from(LIKES).insert(body);
            self.rest.execute(&query).await.into_result()?;
            true
        };

        let likes_count = if liked {
            counters.likes_count + 1
        } else {
            (counters.likes_count - 1).max(0)
        };
        self.write_counter(whisper_id, "likes_count", likes_count).await?;

        info!(whisper_id, user_id = %viewer.user_id, liked, likes_count, "like toggled");
        Ok(LikeToggle { liked, likes_count })
    }

    /// Whether `viewer` has a like row for the whisper
    pub async fn is_liked(&self, whisper_id: &str, viewer: &Viewer) -> Result<bool> {
        let query = self
            .rest
            .from(LIKES)
            .select("whisper_id,user_id")
            .eq("whisper_id", whisper_id)
            .eq("user_id", viewer.user_id.as_str())
            .maybe_single();

        Ok(self.rest.execute(&query).await.row::<Like>()?.is_some())
    }
}
