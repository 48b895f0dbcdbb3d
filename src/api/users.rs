use tracing::info;

use crate::api::{require_viewer, ApiError, Result, WhisperApi, FOLLOWS, LIKES, USERS};
use crate::auth::{AuthProfile, Viewer};
use crate::models::{Follow, User};

impl WhisperApi {
    /// Upsert the provider's profile into `users`, keyed by subject id
    ///
    /// Called on every auth-state change.
    pub async fn sync_user(&self, profile: &AuthProfile) -> Result<User> {
        if profile.subject.trim().is_empty() {
            return Err(ApiError::Validation("profile has no subject id".to_string()));
        }

        let user = profile.to_user();
        let body = serde_json::to_value(&user)
            .map_err(|e| ApiError::Validation(format!("unserializable user: {}", e)))?;
        let query = self.rest.from(USERS).upsert(body, Some("id"));

        let synced = self.rest.execute(&query).await.row::<User>()?;
        info!(user_id = %user.id, anonymous = user.is_anonymous, "user synced");
        Ok(synced.unwrap_or(user))
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let query = self.rest.from(USERS).eq("id", user_id).maybe_single();
        Ok(self.rest.execute(&query).await.row()?)
    }

    pub async fn is_following(&self, viewer: &Viewer, user_id: &str) -> Result<bool> {
        let query = self
            .rest
            .from(FOLLOWS)
            .eq("follower_id", viewer.user_id.as_str())
            .eq("following_id", user_id)
            .maybe_single();
        Ok(self.rest.execute(&query).await.row::<Follow>()?.is_some())
    }

    /// Follow `user_id`; following an already-followed user changes nothing
    pub async fn follow_user(&self, viewer: Option<&Viewer>, user_id: &str) -> Result<()> {
        let viewer = require_viewer(viewer, "follow someone")?;
        if viewer.user_id == user_id {
            return Err(ApiError::Validation("cannot follow yourself".to_string()));
        }
        if self.is_following(viewer, user_id).await? {
            return Ok(());
        }

        let follow = Follow {
            id: None,
            follower_id: viewer.user_id.clone(),
            following_id: user_id.to_string(),
        };
        let body = serde_json::to_value(&follow)
            .map_err(|e| ApiError::Validation(format!("unserializable follow: {}", e)))?;
        self.rest
            .execute(&self.rest.from(FOLLOWS).insert(body))
            .await
            .into_result()?;
        Ok(())
    }

    pub async fn unfollow_user(&self, viewer: Option<&Viewer>, user_id: &str) -> Result<()> {
        let viewer = require_viewer(viewer, "unfollow someone")?;
        let query = self
            .rest
            .from(FOLLOWS)
            .delete()
            .eq("follower_id", viewer.user_id.as_str())
            .eq("following_id", user_id);
        self.rest.execute(&query).await.into_result()?;
        Ok(())
    }

    /// Remove the viewer's likes, follows and user row
    ///
    /// Whispers and chain responses stay. Counters on liked whispers are
    /// not adjusted.
    pub async fn delete_account(&self, viewer: Option<&Viewer>) -> Result<()> {
        let viewer = require_viewer(viewer, "delete your account")?;
        let user_id = viewer.user_id.as_str();

        let steps = [
            self.rest.from(LIKES).delete().eq("user_id", user_id),
            self.rest.from(FOLLOWS).delete().eq("follower_id", user_id),
            self.rest.from(FOLLOWS).delete().eq("following_id", user_id),
            self.rest.from(USERS).delete().eq("id", user_id),
        ];
        for query in &steps {
            self.rest.execute(query).await.into_result()?;
        }

        info!(user_id, "account deleted");
        Ok(())
    }
}
