use crate::rest::RestError;

/// Errors returned by the domain API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The datastore call failed (network, non-2xx, undecodable body)
    #[error("Request failed: {0}")]
    Rest(#[from] RestError),

    /// The operation needs a signed-in viewer
    #[error("You must be signed in to {0}")]
    NotAuthenticated(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller input rejected before any request was made
    #[error("Invalid input: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
