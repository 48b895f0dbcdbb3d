use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::api::{require_viewer, validate_text, ApiError, Result, WhisperApi, LIKES, THEMES, USERS, WHISPERS};
use crate::auth::Viewer;
use crate::batch::{distinct_ids, load_by_ids};
use crate::models::{Like, NewWhisper, Theme, User, Whisper, WhisperRow};

/// Default page size for feeds
pub const DEFAULT_FEED_LIMIT: usize = 50;

/// Feed ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedSort {
    /// Most liked first
    Trending,
    /// Newest first
    #[default]
    Recent,
    /// Most chain responses first
    Chains,
}

impl FeedSort {
    /// Parse a sort name; anything unrecognized means [`FeedSort::Recent`]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "trending" => FeedSort::Trending,
            "chains" => FeedSort::Chains,
            _ => FeedSort::Recent,
        }
    }

    /// Column sorted on, always descending
    pub fn order_column(&self) -> &'static str {
        match self {
            FeedSort::Trending => "likes_count",
            FeedSort::Recent => "created_at",
            FeedSort::Chains => "chain_count",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSort::Trending => "trending",
            FeedSort::Recent => "recent",
            FeedSort::Chains => "chains",
        }
    }
}

impl From<&str> for FeedSort {
    fn from(name: &str) -> Self {
        FeedSort::parse(name)
    }
}

/// Options for reading a whisper feed
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOptions {
    pub sort: FeedSort,
    /// Only whispers tagged with this theme
    pub theme_id: Option<String>,
    pub limit: usize,
}

impl FeedOptions {
    pub fn new(sort: FeedSort) -> Self {
        Self {
            sort,
            theme_id: None,
            limit: DEFAULT_FEED_LIMIT,
        }
    }

    /// Restrict to one theme (builder pattern)
    pub fn with_theme(mut self, theme_id: impl Into<String>) -> Self {
        self.theme_id = Some(theme_id.into());
        self
    }

    /// Set the page size (builder pattern)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self::new(FeedSort::Recent)
    }
}

impl WhisperApi {
    /// Published whispers, sorted and enriched for `viewer`
    pub async fn get_whispers(&self, viewer: Option<&Viewer>, options: FeedOptions) -> Result<Vec<Whisper>> {
        let query = self
            .rest
            .from(WHISPERS)
            .eq("is_published", true)
            .eq("theme_id", options.theme_id.clone())
            .order(options.sort.order_column(), false)
            .limit(options.limit);

        let rows: Vec<WhisperRow> = self.rest.execute(&query).await.rows()?;
        self.enrich(rows, viewer).await
    }

    /// One whisper by id
    pub async fn get_whisper(&self, whisper_id: &str, viewer: Option<&Viewer>) -> Result<Whisper> {
        let query = self.rest.from(WHISPERS).eq("id", whisper_id).single();

        let row: WhisperRow = self
            .rest
            .execute(&query)
            .await
            .row()?
            .ok_or_else(|| ApiError::NotFound(format!("whisper {}", whisper_id)))?;

        self.enrich_one(row, viewer).await
    }

    /// Everything a user has posted, newest first
    pub async fn get_user_whispers(&self, user_id: &str, viewer: Option<&Viewer>) -> Result<Vec<Whisper>> {
        let query = self
            .rest
            .from(WHISPERS)
            .eq("user_id", user_id)
            .order("created_at", false);

        let rows: Vec<WhisperRow> = self.rest.execute(&query).await.rows()?;
        self.enrich(rows, viewer).await
    }

    /// Post a new whisper; the stylized text is generated here
    pub async fn create_whisper(
        &self,
        viewer: Option<&Viewer>,
        text: &str,
        theme_id: Option<&str>,
    ) -> Result<Whisper> {
        let viewer = require_viewer(viewer, "post a whisper")?;
        let text = validate_text(text)?;

        let new_whisper = NewWhisper {
            user_id: viewer.user_id.clone(),
            original_text: text.to_string(),
            transformed_text: self.transform(text),
            theme_id: theme_id.map(str::to_string),
            is_published: true,
        };
        let body = serde_json::to_value(&new_whisper)
            .map_err(|e| ApiError::Validation(format!("unserializable whisper: {}", e)))?;

        let query = self.rest.from(WHISPERS).insert(body);
        let row: WhisperRow = self
            .rest
            .execute(&query)
            .await
            .row()?
            .ok_or_else(|| ApiError::NotFound("inserted whisper was not returned".to_string()))?;

        info!(whisper_id = %row.id, user_id = %viewer.user_id, "whisper created");
        self.enrich_one(row, Some(viewer)).await
    }

    pub(crate) async fn enrich_one(&self, row: WhisperRow, viewer: Option<&Viewer>) -> Result<Whisper> {
        let id = row.id.clone();
        self.enrich(vec![row], viewer)
            .await?
            .pop()
            .ok_or_else(|| ApiError::NotFound(format!("whisper {}", id)))
    }

    /// Attach theme, author and like-state to a page of rows
    ///
    /// Issues at most three lookups (themes, users, the viewer's likes), run
    /// concurrently. Row order is preserved.
    pub(crate) async fn enrich(&self, rows: Vec<WhisperRow>, viewer: Option<&Viewer>) -> Result<Vec<Whisper>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let theme_ids = distinct_ids(rows.iter().filter_map(|r| r.theme_id.as_deref()));
        let user_ids = distinct_ids(rows.iter().map(|r| r.user_id.as_str()));
        let whisper_ids = distinct_ids(rows.iter().map(|r| r.id.as_str()));

        let themes_fut = load_by_ids::<Theme>(&self.rest, THEMES, "id", &theme_ids);
        let users_fut = load_by_ids::<User>(&self.rest, USERS, "id", &user_ids);
        let likes_fut = self.liked_ids(viewer, &whisper_ids);

        let (themes, users, liked) = futures::join!(themes_fut, users_fut, likes_fut);
        let themes: HashMap<String, Theme> = themes?;
        let users: HashMap<String, User> = users?;
        let liked = liked?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut whisper = Whisper::from_row(row);
                if let Some(theme) = whisper.theme_id.as_ref().and_then(|id| themes.get(id)) {
                    whisper.attach_theme(theme);
                }
                if let Some(user) = users.get(&whisper.user_id) {
                    whisper.attach_author(user);
                }
                whisper.is_liked = liked.contains(&whisper.id);
                whisper
            })
            .collect())
    }

    // Ids among `whisper_ids` the viewer has liked; nobody likes anything when signed out
    async fn liked_ids(&self, viewer: Option<&Viewer>, whisper_ids: &[String]) -> Result<HashSet<String>> {
        let viewer = match viewer {
            Some(viewer) if !whisper_ids.is_empty() => viewer,
            _ => return Ok(HashSet::new()),
        };

        let query = self
            .rest
            .from(LIKES)
            .select("whisper_id,user_id")
            .eq("user_id", viewer.user_id.as_str())
            .in_list("whisper_id", whisper_ids.iter().cloned());

        let likes: Vec<Like> = self.rest.execute(&query).await.rows()?;
        Ok(likes.into_iter().map(|like| like.whisper_id).collect())
    }
}
