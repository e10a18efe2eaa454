//! Token endpoint interactions
//!
//! The two grant types the lifecycle needs, plus token introspection:
//! 1. Authorization code exchange (first run, completes the interactive flow)
//! 2. Token refresh (keeps the access token current without the user)
//! 3. Status lookup for an existing access token
//!
//! All three POST form-encoded bodies to endpoints taken from `OAuthConfig`.
//! No retry or backoff here — a failed call is reported immediately and the
//! decision to retry belongs to the caller.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OAuthConfig;
use crate::error::{Error, Result};

/// Response from the token endpoint for both exchange and refresh.
///
/// `expires_in` is a delta in seconds from the response time; the caller
/// converts it to an absolute unix timestamp when building the `TokenSet`.
/// A response missing `access_token`, `refresh_token` or `expires_in` is
/// incomplete and fails deserialization.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires (delta, not absolute)
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Exchange an authorization code for the initial token set.
///
/// `state` is echoed back to the provider along with the code; the CSRF
/// equality check happened before this call.
pub async fn exchange_code(
    client: &reqwest::Client,
    config: &OAuthConfig,
    code: &str,
    state: &str,
) -> Result<TokenResponse> {
    debug!(token_uri = %config.token_uri, "exchanging authorization code");

    let response = client
        .post(&config.token_uri)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", &config.client_id),
            ("client_secret", config.client_secret.expose()),
            ("code", code),
            ("redirect_uri", &config.redirect_uri),
            ("state", state),
        ])
        .send()
        .await
        .map_err(|e| Error::TokenExchange(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::TokenExchange(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))
}

/// Refresh an access token using a refresh token.
///
/// Any failure — transport, non-success status, incomplete payload — maps
/// to [`Error::Refresh`] so the caller can leave the stored credential
/// untouched.
pub async fn refresh(
    client: &reqwest::Client,
    config: &OAuthConfig,
    refresh_token: &str,
) -> Result<TokenResponse> {
    debug!(token_uri = %config.token_uri, "refreshing access token");

    let response = client
        .post(&config.token_uri)
        .form(&[
            ("grant_type", "refresh_token"),
            ("client_id", &config.client_id),
            ("client_secret", config.client_secret.expose()),
            ("refresh_token", refresh_token),
            ("redirect_uri", &config.redirect_uri),
        ])
        .send()
        .await
        .map_err(|e| Error::Refresh(format!("token refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Refresh(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::Refresh(format!("invalid refresh response: {e}")))
}

/// Look up the provider-side status of an access token.
///
/// Returns the raw JSON payload; the shape is provider-defined.
pub async fn token_status(
    client: &reqwest::Client,
    status_uri: &str,
    access_token: &str,
) -> Result<serde_json::Value> {
    let response = client
        .post(status_uri)
        .form(&[("access_token", access_token)])
        .send()
        .await
        .map_err(|e| Error::TokenExchange(format!("token status request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::TokenExchange(format!(
            "token status endpoint returned {status}: {body}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid token status response: {e}")))
}
