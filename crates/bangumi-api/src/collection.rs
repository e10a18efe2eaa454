//! Collection endpoints
//!
//! Thin parameter-to-URL mappings over `/collection/...`. Both operations
//! require a credential, supplied on every call by the injected
//! `CredentialProvider` — the wrapper itself holds no token state.

use std::sync::Arc;

use bangumi_auth::CredentialProvider;
use tracing::debug;

use crate::error::{Error, Result};

/// Collection status for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Wish,
    Collect,
    Do,
    OnHold,
    Dropped,
}

impl CollectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wish => "wish",
            Self::Collect => "collect",
            Self::Do => "do",
            Self::OnHold => "on_hold",
            Self::Dropped => "dropped",
        }
    }
}

/// Collection visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Privacy {
    #[default]
    Public,
    Private,
}

impl Privacy {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "0",
            Self::Private => "1",
        }
    }
}

/// Fields for a collection update.
#[derive(Debug, Clone)]
pub struct SubjectUpdate {
    pub status: CollectionStatus,
    pub comment: Option<String>,
    pub tags: Vec<String>,
    pub rating: Option<u8>,
    pub privacy: Privacy,
}

impl SubjectUpdate {
    pub fn new(status: CollectionStatus) -> Self {
        Self {
            status,
            comment: None,
            tags: Vec::new(),
            rating: None,
            privacy: Privacy::Public,
        }
    }
}

/// Client for the collection endpoints.
pub struct CollectionClient {
    base_uri: String,
    client: reqwest::Client,
    provider: Arc<dyn CredentialProvider>,
}

impl CollectionClient {
    pub fn new(
        base_uri: impl Into<String>,
        client: reqwest::Client,
        provider: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            base_uri: base_uri.into().trim_end_matches('/').to_owned(),
            client,
            provider,
        }
    }

    /// GET `/collection/{subject_id}` — collection details for a subject.
    pub async fn get_subject(&self, subject_id: u64) -> Result<serde_json::Value> {
        let header = self.provider.authorization_header().await?;
        let uri = format!("{}/collection/{subject_id}", self.base_uri);
        debug!(%uri, "fetching subject collection");

        let response = self
            .client
            .get(&uri)
            .header("Authorization", header)
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {uri}: {e}")))?;

        decode_json(response).await
    }

    /// POST `/collection/{subject_id}/update` — create or update a
    /// collection entry. Tags are joined with spaces, as the API expects.
    pub async fn update_subject(
        &self,
        subject_id: u64,
        update: &SubjectUpdate,
    ) -> Result<serde_json::Value> {
        let header = self.provider.authorization_header().await?;
        let uri = format!("{}/collection/{subject_id}/update", self.base_uri);
        debug!(%uri, status = update.status.as_str(), "updating subject collection");

        let mut form: Vec<(&str, String)> = vec![
            ("subject_id", subject_id.to_string()),
            ("status", update.status.as_str().to_owned()),
            ("privacy", update.privacy.as_str().to_owned()),
        ];
        if let Some(comment) = &update.comment {
            form.push(("comment", comment.clone()));
        }
        if !update.tags.is_empty() {
            form.push(("tags", update.tags.join(" ")));
        }
        if let Some(rating) = update.rating {
            form.push(("rating", rating.to_string()));
        }

        let response = self
            .client
            .post(&uri)
            .header("Authorization", header)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Http(format!("POST {uri}: {e}")))?;

        decode_json(response).await
    }
}

/// Check the status and decode the JSON body.
pub(crate) async fn decode_json(response: reqwest::Response) -> Result<serde_json::Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| Error::Decode(e.to_string()))
}
