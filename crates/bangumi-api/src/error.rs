//! Error types for API wrappers

/// Errors from resource endpoint calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Credential could not be obtained or refreshed
    #[error(transparent)]
    Auth(#[from] bangumi_auth::Error),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Result alias for API operations.
pub type Result<T> = std::result::Result<T, Error>;
