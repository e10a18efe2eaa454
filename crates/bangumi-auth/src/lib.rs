//! OAuth2 token lifecycle for the Bangumi API
//!
//! Client-side credential management for the authorization-code grant:
//! obtaining, persisting, validating, and transparently refreshing a
//! single token set around arbitrary API calls. This crate is a standalone
//! library with no dependency on the CLI binary.
//!
//! Credential flow:
//! 1. `TokenGuard::ensure()` finds no stored credential
//! 2. `AuthorizationFlow` presents the consent URL and waits for the
//!    pasted-back redirect, validating the CSRF `state`
//! 3. The authorization code is exchanged and the `TokenSet` persisted
//!    via `CredentialStore`
//! 4. Later calls find the credential fresh (no network) or expired,
//!    in which case `RefreshFlow` replaces it in one atomic write
//! 5. API wrappers receive the `"{token_type} {access_token}"` header
//!    value through the `CredentialProvider` capability

pub mod authorize;
pub mod config;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod query;
pub mod refresh;
pub mod secret;
pub mod state;
pub mod token;

pub use authorize::{AuthorizationFlow, Prompt, StdinPrompt};
pub use config::OAuthConfig;
pub use credentials::{CredentialStore, TokenSet, unix_now};
pub use error::{Error, Result};
pub use guard::{CredentialProvider, TokenGuard};
pub use query::parse_redirect_url;
pub use refresh::RefreshFlow;
pub use secret::Secret;
pub use state::generate_state;
pub use token::{TokenResponse, exchange_code, token_status};
