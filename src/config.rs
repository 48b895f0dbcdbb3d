//! Application configuration loaded from the environment

use thiserror::Error;

/// Configuration errors raised at startup
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// One or more required variables are unset or empty
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    /// A variable is set but cannot be parsed
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

/// Deployment environment flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::Invalid {
                key: APP_ENV.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

pub const DATABASE_URL: &str = "SUPABASE_URL";
pub const DATABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const AUTH_PUBLISHABLE_KEY: &str = "CLERK_PUBLISHABLE_KEY";
pub const APP_ENV: &str = "APP_ENV";
pub const HTTP_CONNECT_TIMEOUT_SECS: &str = "HTTP_CONNECT_TIMEOUT_SECS";

const REQUIRED: [&str; 3] = [DATABASE_URL, DATABASE_ANON_KEY, AUTH_PUBLISHABLE_KEY];

/// OAuth client credentials for one social provider
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: Option<String>,
}

/// Everything the client needs to reach its backends
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the REST datastore
    pub database_url: String,
    pub database_anon_key: String,
    /// Publishable key of the auth provider
    pub auth_publishable_key: String,
    pub google_oauth: Option<OAuthClient>,
    pub apple_oauth: Option<OAuthClient>,
    /// Not used by the template transform
    pub ai_api_key: Option<String>,
    pub environment: Environment,
    pub connect_timeout_secs: u64,
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    ///
    /// Empty values count as missing. All missing required keys are
    /// reported together.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<String> = REQUIRED
            .iter()
            .filter(|key| get(**key).is_none())
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let environment = match get(APP_ENV) {
            Some(value) => Environment::parse(&value)?,
            None => Environment::Development,
        };

        let connect_timeout_secs = match get(HTTP_CONNECT_TIMEOUT_SECS) {
            Some(value) => value.parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: HTTP_CONNECT_TIMEOUT_SECS.to_string(),
                value,
            })?,
            None => 5,
        };

        let oauth = |id_key: &str, secret_key: &str| {
            get(id_key).map(|client_id| OAuthClient {
                client_id,
                client_secret: get(secret_key),
            })
        };

        Ok(Self {
            database_url: get(DATABASE_URL).unwrap_or_default(),
            database_anon_key: get(DATABASE_ANON_KEY).unwrap_or_default(),
            auth_publishable_key: get(AUTH_PUBLISHABLE_KEY).unwrap_or_default(),
            google_oauth: oauth("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            apple_oauth: oauth("APPLE_CLIENT_ID", "APPLE_CLIENT_SECRET"),
            ai_api_key: get("OPENAI_API_KEY"),
            environment,
            connect_timeout_secs,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}
