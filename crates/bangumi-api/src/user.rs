//! User endpoints
//!
//! Wrappers over `/user/{username}/...`. Most of these are public and need
//! only the registered `app_id`; watching progress requires a credential
//! and goes through the injected `CredentialProvider`.

use std::sync::Arc;

use bangumi_auth::CredentialProvider;
use tracing::debug;

use crate::collection::decode_json;
use crate::error::{Error, Result};

/// Category filter for the watching collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatchingCategory {
    /// Anime and real
    #[default]
    Watching,
    /// Anime, real, and books
    AllWatching,
}

impl WatchingCategory {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Watching => "watching",
            Self::AllWatching => "all_watching",
        }
    }
}

/// Verbosity of collection responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseGroup {
    #[default]
    Medium,
    Small,
}

impl ResponseGroup {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::Small => "small",
        }
    }
}

/// Subject type for per-type collection listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectType {
    Book,
    Anime,
    Music,
    Game,
    Real,
}

impl SubjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Anime => "anime",
            Self::Music => "music",
            Self::Game => "game",
            Self::Real => "real",
        }
    }
}

/// Client for the user endpoints.
pub struct UserClient {
    base_uri: String,
    app_id: String,
    client: reqwest::Client,
    provider: Arc<dyn CredentialProvider>,
}

impl UserClient {
    pub fn new(
        base_uri: impl Into<String>,
        app_id: impl Into<String>,
        client: reqwest::Client,
        provider: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            base_uri: base_uri.into().trim_end_matches('/').to_owned(),
            app_id: app_id.into(),
            client,
            provider,
        }
    }

    /// GET `/user/{username}` — public profile info. `username` may be a
    /// username or a numeric user id.
    pub async fn info(&self, username: &str) -> Result<serde_json::Value> {
        let uri = format!("{}/user/{username}", self.base_uri);
        debug!(%uri, "fetching user info");
        let response = self
            .client
            .get(&uri)
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {uri}: {e}")))?;
        decode_json(response).await
    }

    /// GET `/user/{username}/collection` — subjects the user is watching.
    pub async fn collection(
        &self,
        username: &str,
        category: WatchingCategory,
        subject_ids: &[u64],
        response_group: ResponseGroup,
    ) -> Result<serde_json::Value> {
        let uri = format!("{}/user/{username}/collection", self.base_uri);
        debug!(%uri, category = category.as_str(), "fetching user collection");

        let mut params: Vec<(&str, String)> = vec![
            ("cat", category.as_str().to_owned()),
            ("responseGroup", response_group.as_str().to_owned()),
        ];
        if !subject_ids.is_empty() {
            let ids = subject_ids
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            params.push(("ids", ids));
        }

        let response = self
            .client
            .get(&uri)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {uri}: {e}")))?;
        decode_json(response).await
    }

    /// GET `/user/{username}/collections/{subject_type}` — the user's
    /// collection for one subject type. `max_results` caps at 25 server-side.
    pub async fn collections_by_type(
        &self,
        username: &str,
        subject_type: SubjectType,
        max_results: u32,
    ) -> Result<serde_json::Value> {
        let uri = format!(
            "{}/user/{username}/collections/{}",
            self.base_uri,
            subject_type.as_str()
        );
        debug!(%uri, "fetching typed collection");

        let response = self
            .client
            .get(&uri)
            .query(&[
                ("app_id", self.app_id.as_str()),
                ("max_results", &max_results.to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {uri}: {e}")))?;
        decode_json(response).await
    }

    /// GET `/user/{username}/collections/status` — summary counts across
    /// all collection types.
    pub async fn collection_status(&self, username: &str) -> Result<serde_json::Value> {
        let uri = format!("{}/user/{username}/collections/status", self.base_uri);
        let response = self
            .client
            .get(&uri)
            .query(&[("app_id", self.app_id.as_str())])
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {uri}: {e}")))?;
        decode_json(response).await
    }

    /// GET `/user/{username}/progress` — per-episode watching progress.
    /// Requires a credential; optionally narrowed to one subject.
    pub async fn progress(
        &self,
        username: &str,
        subject_id: Option<u64>,
    ) -> Result<serde_json::Value> {
        let header = self.provider.authorization_header().await?;
        let uri = format!("{}/user/{username}/progress", self.base_uri);
        debug!(%uri, ?subject_id, "fetching watching progress");

        let mut request = self.client.get(&uri).header("Authorization", header);
        if let Some(id) = subject_id {
            request = request.query(&[("subject_id", id.to_string())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {uri}: {e}")))?;
        decode_json(response).await
    }
}
