//! OAuth client configuration
//!
//! An explicit context object constructed once at startup and passed by
//! reference into the flows. There is no ambient/global configuration;
//! the binary builds this from its TOML config file.

use crate::secret::Secret;

/// Registered application credentials and provider endpoints.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Application client ID (public)
    pub client_id: String,
    /// Application client secret, redacted in logs
    pub client_secret: Secret,
    /// Redirect URI registered with the provider. Used both in the
    /// authorization URL and in every token endpoint request.
    pub redirect_uri: String,
    /// Authorization endpoint (user-facing consent page)
    pub authorize_uri: String,
    /// Token endpoint for code exchange and refresh
    pub token_uri: String,
    /// Optional token introspection endpoint
    pub token_status_uri: Option<String>,
}

#[cfg(test)]
impl OAuthConfig {
    /// Config pointing at a test server. Shared by flow tests.
    pub(crate) fn for_tests(base: &str) -> Self {
        Self {
            client_id: "app_id_test".into(),
            client_secret: Secret::new("app_secret_test"),
            redirect_uri: "http://localhost/callback".into(),
            authorize_uri: format!("{base}/oauth/authorize"),
            token_uri: format!("{base}/oauth/access_token"),
            token_status_uri: Some(format!("{base}/oauth/token_status")),
        }
    }
}
