//! Ensure-then-call credential guard
//!
//! The single entry point API-calling code depends on. Before every
//! protected operation the guard walks the lifecycle state machine:
//!
//! `NoCredential → (authorize) → Fresh → (time passes) → Expired →
//! (refresh) → Fresh → …`
//!
//! No credential on disk triggers the interactive authorization flow (the
//! only path that can block on human input); an expired credential triggers
//! a non-forced refresh; a fresh one costs zero network calls. The
//! check-then-call sequence is not atomic against server-side revocation:
//! if the token is invalidated between the freshness check and the wrapped
//! call, the call itself observes the authentication failure — the guard
//! does not retry mid-call.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, info};

use crate::authorize::{AuthorizationFlow, Prompt};
use crate::config::OAuthConfig;
use crate::credentials::{CredentialStore, TokenSet, unix_now};
use crate::error::Result;
use crate::refresh::RefreshFlow;

/// Capability to produce a valid Authorization header value on demand.
///
/// Injected into every API-calling component: "call me with your operation;
/// you receive a valid header value, or the call never happens because an
/// error was raised instead." Boxed futures keep the trait dyn-compatible
/// (`Arc<dyn CredentialProvider>`).
pub trait CredentialProvider: Send + Sync {
    /// Ensure a valid credential exists and return the derived
    /// `Authorization` header value.
    fn authorization_header(&self) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;
}

/// Guard owning everything the lifecycle needs.
pub struct TokenGuard {
    config: OAuthConfig,
    store: CredentialStore,
    client: reqwest::Client,
    prompt: Box<dyn Prompt>,
}

impl TokenGuard {
    pub fn new(
        config: OAuthConfig,
        store: CredentialStore,
        client: reqwest::Client,
        prompt: Box<dyn Prompt>,
    ) -> Self {
        Self {
            config,
            store,
            client,
            prompt,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Walk the state machine until a fresh token set is at hand.
    pub async fn ensure(&self) -> Result<TokenSet> {
        if !self.store.exists() {
            info!("no stored credential, starting interactive authorization");
            return AuthorizationFlow::new(
                &self.config,
                &self.store,
                &self.client,
                self.prompt.as_ref(),
            )
            .run()
            .await;
        }

        let tokens = self.store.load().await?;
        if !tokens.is_fresh(unix_now()) {
            debug!(expires = tokens.expires, "stored credential expired, refreshing");
            return RefreshFlow::new(&self.config, &self.store, &self.client)
                .refresh(false)
                .await;
        }
        Ok(tokens)
    }

    /// Ensure a valid credential, then invoke `f` with the Authorization
    /// header value and return its output unchanged.
    pub async fn call<T, F, Fut>(&self, f: F) -> Result<T>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = T>,
    {
        let tokens = self.ensure().await?;
        Ok(f(tokens.authorization_header()).await)
    }
}

impl CredentialProvider for TokenGuard {
    fn authorization_header(&self) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async { Ok(self.ensure().await?.authorization_header()) })
    }
}
