//! Error types for the token lifecycle

/// Errors from credential storage and the OAuth flows.
///
/// Flows never swallow failures and never retry; each surfaces a distinct
/// variant to the caller (the guard or a direct flow invoker). A failed
/// refresh leaves the previously stored credential untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no stored credential: {0}")]
    NotFound(String),

    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("token refresh failed: {0}")]
    Refresh(String),

    #[error("state mismatch: sent {sent:?}, got back {received:?}")]
    StateMismatch {
        sent: String,
        received: Option<String>,
    },

    #[error("authorization cancelled by user")]
    Cancelled,
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
