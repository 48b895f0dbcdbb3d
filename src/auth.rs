//! Session glue between the auth provider and the API
//!
//! The auth provider owns sign-in; this module only carries its results:
//! who is calling ([`Viewer`]), what the provider knows about them
//! ([`AuthProfile`]), and the throwaway credentials used to emulate
//! anonymous accounts.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::models::User;

/// Identity of the caller of an API operation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Viewer {
    pub user_id: String,
}

impl Viewer {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Profile reported by the auth provider after sign-in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthProfile {
    /// Provider subject id; becomes `users.id`
    pub subject: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

impl AuthProfile {
    pub fn viewer(&self) -> Viewer {
        Viewer::new(self.subject.clone())
    }

    /// "First Last", then the username, then the local part of the email
    pub fn display_name(&self) -> Option<String> {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return Some(full);
        }

        self.username
            .clone()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
    }

    /// Row upserted into `users` on every auth-state change
    pub fn to_user(&self) -> User {
        User {
            id: self.subject.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            display_name: self.display_name(),
            avatar_url: self.image_url.clone(),
            is_anonymous: self.is_anonymous,
            created_at: None,
            updated_at: Some(chrono::Utc::now()),
        }
    }
}

/// Domain used for generated anonymous accounts
pub const ANONYMOUS_EMAIL_DOMAIN: &str = "whisperchain.app";

const ANONYMOUS_PASSWORD_LEN: usize = 24;

/// Generated email/password registered as a real account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousCredentials {
    pub email: String,
    pub password: String,
}

impl AnonymousCredentials {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let tag: u64 = rng.gen();
        let password: String = (0..ANONYMOUS_PASSWORD_LEN)
            .map(|_| char::from(rng.sample(Alphanumeric)))
            .collect();

        Self {
            email: format!("anon_{:016x}@{}", tag, ANONYMOUS_EMAIL_DOMAIN),
            password,
        }
    }

    pub fn is_anonymous_email(email: &str) -> bool {
        email.starts_with("anon_") && email.ends_with(&format!("@{}", ANONYMOUS_EMAIL_DOMAIN))
    }
}

/// Local storage for the one anonymous credential record
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<AnonymousCredentials>;
    fn save(&self, credentials: &AnonymousCredentials);
    fn clear(&self);
}

/// Process-local [`CredentialStore`]
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<AnonymousCredentials>>,
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<AnonymousCredentials> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save(&self, credentials: &AnonymousCredentials) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(credentials.clone());
    }

    fn clear(&self) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Stored anonymous credentials, generating and saving new ones on first use
pub fn anonymous_credentials<R: Rng + ?Sized>(store: &dyn CredentialStore, rng: &mut R) -> AnonymousCredentials {
    if let Some(existing) = store.load() {
        return existing;
    }
    let created = AnonymousCredentials::generate(rng);
    store.save(&created);
    tracing::info!(email = %created.email, "generated anonymous credentials");
    created
}
