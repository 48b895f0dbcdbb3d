// Rows as stored by the datastore, and the views the API hands back

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest accepted whisper or chain response, in characters
pub const MAX_TEXT_CHARS: usize = 280;

// Whisper row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WhisperRow {
    pub id: String,
    pub user_id: String,
    pub original_text: String,
    pub transformed_text: String,
    #[serde(default)]
    pub theme_id: Option<String>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub chain_count: i64,
    #[serde(default = "default_published")]
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

fn default_published() -> bool {
    true
}

/// Insert body for a new whisper; ids, counters and timestamps come from the backend
#[derive(Debug, Clone, Serialize)]
pub struct NewWhisper {
    pub user_id: String,
    pub original_text: String,
    pub transformed_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
    pub is_published: bool,
}

/// A whisper with theme, author and like-state attached
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Whisper {
    pub id: String,
    pub user_id: String,
    pub original_text: String,
    pub transformed_text: String,
    pub theme_id: Option<String>,
    pub theme_name: Option<String>,
    pub theme_color: Option<String>,
    pub likes_count: i64,
    pub chain_count: i64,
    pub created_at: DateTime<Utc>,
    pub is_liked: bool,
    pub author_username: Option<String>,
    pub author_display_name: Option<String>,
    pub author_avatar_url: Option<String>,
}

impl Whisper {
    /// A view with nothing joined yet
    pub fn from_row(row: WhisperRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            original_text: row.original_text,
            transformed_text: row.transformed_text,
            theme_id: row.theme_id,
            theme_name: None,
            theme_color: None,
            likes_count: row.likes_count,
            chain_count: row.chain_count,
            created_at: row.created_at,
            is_liked: false,
            author_username: None,
            author_display_name: None,
            author_avatar_url: None,
        }
    }

    /// Optimistic local update after a like toggle
    ///
    /// Does nothing if the state already matches.
    pub fn apply_like_toggle(&mut self, liked: bool) {
        if self.is_liked == liked {
            return;
        }
        self.is_liked = liked;
        self.likes_count = if liked {
            self.likes_count + 1
        } else {
            (self.likes_count - 1).max(0)
        };
    }

    pub fn attach_theme(&mut self, theme: &Theme) {
        self.theme_name = Some(theme.name.clone());
        self.theme_color = theme.color.clone();
    }

    pub fn attach_author(&mut self, user: &User) {
        self.author_username = user.username.clone();
        self.author_display_name = user.display_name.clone();
        self.author_avatar_url = user.avatar_url.clone();
    }
}

// Chain response row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainResponseRow {
    pub id: String,
    pub whisper_id: String,
    pub user_id: String,
    pub original_text: String,
    pub transformed_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewChainResponse {
    pub whisper_id: String,
    pub user_id: String,
    pub original_text: String,
    pub transformed_text: String,
}

/// A chain response with author fields attached
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainResponse {
    pub id: String,
    pub whisper_id: String,
    pub user_id: String,
    pub original_text: String,
    pub transformed_text: String,
    pub created_at: DateTime<Utc>,
    pub author_username: Option<String>,
    pub author_display_name: Option<String>,
    pub author_avatar_url: Option<String>,
}

impl ChainResponse {
    pub fn from_row(row: ChainResponseRow, author: Option<&User>) -> Self {
        Self {
            id: row.id,
            whisper_id: row.whisper_id,
            user_id: row.user_id,
            original_text: row.original_text,
            transformed_text: row.transformed_text,
            created_at: row.created_at,
            author_username: author.and_then(|u| u.username.clone()),
            author_display_name: author.and_then(|u| u.display_name.clone()),
            author_avatar_url: author.and_then(|u| u.avatar_url.clone()),
        }
    }
}

// Theme (read-only)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Theme {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// User, keyed by the auth provider's subject id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// Like join row; (whisper_id, user_id) is unique
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Like {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub whisper_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Like {
    pub fn new(whisper_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: None,
            whisper_id: whisper_id.into(),
            user_id: user_id.into(),
            created_at: None,
        }
    }
}

// Follow join row; (follower_id, following_id) is unique
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Follow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub follower_id: String,
    pub following_id: String,
}
