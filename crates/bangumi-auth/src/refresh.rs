//! Non-interactive token refresh
//!
//! Keeps the access token current once a credential exists. The common
//! fast path — token still fresh, `force` off — touches neither the
//! network nor the store. A failed refresh never overwrites the stored
//! credential, not even partially: the successor record is only persisted
//! after the endpoint call has fully succeeded.

use tracing::{debug, info};

use crate::config::OAuthConfig;
use crate::credentials::{CredentialStore, TokenSet, unix_now};
use crate::error::Result;
use crate::token;

/// Refresh-token grant over an existing stored credential.
pub struct RefreshFlow<'a> {
    config: &'a OAuthConfig,
    store: &'a CredentialStore,
    client: &'a reqwest::Client,
}

impl<'a> RefreshFlow<'a> {
    pub fn new(
        config: &'a OAuthConfig,
        store: &'a CredentialStore,
        client: &'a reqwest::Client,
    ) -> Self {
        Self {
            config,
            store,
            client,
        }
    }

    /// Refresh the stored token set if stale, or unconditionally with `force`.
    ///
    /// Fails with `NotFound` when no credential exists — refresh cannot
    /// mint an initial token. Returns the token set that is current after
    /// the call (untouched on the fast path, the successor otherwise).
    pub async fn refresh(&self, force: bool) -> Result<TokenSet> {
        let current = self.store.load().await?;

        let now = unix_now();
        if current.is_fresh(now) {
            if !force {
                debug!(expires = current.expires, "access token still fresh, skipping refresh");
                return Ok(current);
            }
            info!(expires = current.expires, "access token still fresh, refreshing anyway (forced)");
        } else {
            info!(expires = current.expires, "access token expired, refreshing");
        }

        // Any error from here propagates before the store is touched.
        let response = token::refresh(self.client, self.config, &current.refresh_token).await?;

        let updated = current.refreshed(response, unix_now());
        self.store.save(&updated).await?;
        info!(expires = updated.expires, "token refresh complete");
        Ok(updated)
    }
}
