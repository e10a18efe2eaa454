//! Interactive authorization-code flow
//!
//! First-run path: mints the initial token set with the user present.
//! The flow prints an authorization URL, blocks until the user pastes back
//! the redirect URL they landed on, validates the CSRF state, exchanges
//! the code, and persists the result. Nothing is written to the store
//! until the exchange has succeeded.

use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::config::OAuthConfig;
use crate::credentials::{CredentialStore, TokenSet, unix_now};
use crate::error::{Error, Result};
use crate::query::parse_redirect_url;
use crate::state::generate_state;
use crate::token;

/// User-interaction surface for the authorization flow.
///
/// Boxed futures keep the trait dyn-compatible so the guard can hold a
/// `Box<dyn Prompt>` and tests can script the interaction.
pub trait Prompt: Send + Sync {
    /// Present the authorization URL to the user.
    fn present_url(&self, url: &str);

    /// Block until the user supplies the full redirect URL they were sent
    /// to after consenting. An interrupted wait returns [`Error::Cancelled`].
    fn read_redirect_url(&self) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;
}

/// Prompt backed by stdout/stdin.
///
/// Prints the URL rather than launching a browser; the wait races a
/// Ctrl-C signal so the user can abort without persisting partial state.
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn present_url(&self, url: &str) {
        println!("Open this URL in your browser and authorize access:\n\n  {url}\n");
        println!("Then paste the full redirect URL here and press Enter:");
    }

    fn read_redirect_url(&self) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async {
            let mut line = String::new();
            let mut reader = BufReader::new(tokio::io::stdin());
            tokio::select! {
                read = reader.read_line(&mut line) => {
                    let n = read.map_err(|e| Error::Io(format!("reading redirect URL: {e}")))?;
                    if n == 0 {
                        // stdin closed before any input
                        return Err(Error::Cancelled);
                    }
                    Ok(line.trim().to_owned())
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received, aborting authorization");
                    Err(Error::Cancelled)
                }
            }
        })
    }
}

/// One-shot interactive authorization-code grant.
pub struct AuthorizationFlow<'a> {
    config: &'a OAuthConfig,
    store: &'a CredentialStore,
    client: &'a reqwest::Client,
    prompt: &'a dyn Prompt,
}

impl<'a> AuthorizationFlow<'a> {
    pub fn new(
        config: &'a OAuthConfig,
        store: &'a CredentialStore,
        client: &'a reqwest::Client,
        prompt: &'a dyn Prompt,
    ) -> Self {
        Self {
            config,
            store,
            client,
            prompt,
        }
    }

    /// Run the flow to completion and persist the minted token set.
    pub async fn run(&self) -> Result<TokenSet> {
        let state = generate_state();
        let url = self.authorization_url(&state)?;
        debug!(%url, "built authorization URL");

        self.prompt.present_url(&url);
        let pasted = self.prompt.read_redirect_url().await?;
        debug!(%pasted, "received redirect URL");

        let params = parse_redirect_url(&pasted);

        let received_state = params.get("state").cloned();
        if received_state.as_deref() != Some(state.as_str()) {
            // CSRF check: a redirect carrying a different state than the one
            // generated for this attempt is a security failure, not a typo
            // to paper over.
            warn!(sent = %state, received = ?received_state, "state mismatch in redirect URL");
            return Err(Error::StateMismatch {
                sent: state,
                received: received_state,
            });
        }

        let code = params.get("code").ok_or_else(|| {
            warn!(%pasted, "redirect URL has no 'code' parameter");
            Error::TokenExchange(format!("redirect URL missing 'code' parameter: {pasted}"))
        })?;

        let response = token::exchange_code(self.client, self.config, code, &state).await?;
        let tokens = TokenSet::issued(response, unix_now());
        self.store.save(&tokens).await?;
        info!(expires = tokens.expires, "authorization complete, credential stored");
        Ok(tokens)
    }

    fn authorization_url(&self, state: &str) -> Result<String> {
        let query = serde_urlencoded::to_string([
            ("client_id", self.config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("state", state),
        ])
        .map_err(|e| Error::TokenExchange(format!("encoding authorization URL: {e}")))?;
        Ok(format!("{}?{}", self.config.authorize_uri, query))
    }
}
